//! AttWalk - Bluetooth LE attribute discovery
//!
//! This library decodes Attribute Protocol (ATT) response PDUs and walks a
//! remote attribute table with the paginated Read By Type and Read By Group
//! Type procedures, producing typed handle/value/UUID tuples. Connection
//! setup is left to the caller, who supplies an [`AttTransport`].

pub mod att;
pub mod error;
pub mod uuid;

// Re-export common types for convenience
pub use att::{
    decode, decode_as, AttErrorCode, AttTransport, DecodeError, Discovery, DiscoveryConfig,
    DiscoveryState, Frame, L2capAttSocket, LogObserver, PaginationError, PduObserver,
    ReadByGroupElement, ReadByTypeElement,
};
pub use error::Error;
pub use uuid::Uuid;
