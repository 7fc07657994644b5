//! Error types for the attwalk library
//!
//! Each layer has its own error enum; [`Error`] wraps them for callers that
//! want a single type.

use crate::att::{DecodeError, PaginationError};
use crate::uuid::UuidParseError;
use thiserror::Error;

/// Any error produced by this crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to decode PDU: {0}")]
    Decode(#[from] DecodeError),

    #[error("Discovery failed: {0}")]
    Pagination(#[from] PaginationError),

    #[error("Invalid UUID: {0}")]
    Uuid(#[from] UuidParseError),
}

/// Crate result type
pub type Result<T> = std::result::Result<T, Error>;
