//! Attribute Protocol (ATT) client-side discovery
//!
//! This module decodes the ATT responses used during discovery and drives
//! the paginated Read By Type / Read By Group Type procedures over any
//! [`AttTransport`].

pub mod constants;
pub mod discovery;
pub mod error;
pub mod observer;
pub mod pdu;
pub mod reader;
pub mod request;
pub mod transport;
pub mod types;

// Re-export the public API
pub use self::constants::*;
pub use self::discovery::{
    Discovery, DiscoveryConfig, DiscoveryState, DiscoveryStrategy, ReadByGroupType, ReadByType,
};
pub use self::error::{AttErrorCode, DecodeError, DecodeResult, PaginationError, PaginationResult};
pub use self::observer::{LogObserver, PduObserver};
pub use self::pdu::{
    decode, decode_as, ErrorFrame, Frame, ReadByGroupTypeFrame, ReadByTypeFrame, ResponsePdu,
};
pub use self::request::{encode_read_by_group_request, encode_read_by_type_request};
pub use self::transport::{AttTransport, L2capAttSocket};
pub use self::types::{ReadByGroupElement, ReadByTypeElement};
