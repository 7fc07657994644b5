//! Error handling for ATT decoding and discovery
use super::constants::*;
use thiserror::Error;

/// ATT error codes carried in an Error Response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttErrorCode {
    /// Invalid handle
    InvalidHandle,
    /// Read not permitted
    ReadNotPermitted,
    /// Write not permitted
    WriteNotPermitted,
    /// Invalid PDU
    InvalidPdu,
    /// Insufficient authentication
    InsufficientAuthentication,
    /// Request not supported
    RequestNotSupported,
    /// Invalid offset
    InvalidOffset,
    /// Insufficient authorization
    InsufficientAuthorization,
    /// Prepare queue full
    PrepareQueueFull,
    /// Attribute not found
    AttributeNotFound,
    /// Attribute not long
    AttributeNotLong,
    /// Insufficient encryption key size
    InsufficientEncryptionKeySize,
    /// Invalid attribute value length
    InvalidAttributeValueLength,
    /// Unlikely error
    Unlikely,
    /// Insufficient encryption
    InsufficientEncryption,
    /// Unsupported group type
    UnsupportedGroupType,
    /// Insufficient resources
    InsufficientResources,
    /// Database out of sync
    DatabaseOutOfSync,
    /// Value not allowed
    ValueNotAllowed,
    /// Application error
    ApplicationError(u8),
    /// Common profile error
    CommonProfileError(u8),
    /// Reserved or unknown error code
    Unknown(u8),
}

impl From<u8> for AttErrorCode {
    fn from(code: u8) -> Self {
        match code {
            ATT_ERROR_INVALID_HANDLE => AttErrorCode::InvalidHandle,
            ATT_ERROR_READ_NOT_PERMITTED => AttErrorCode::ReadNotPermitted,
            ATT_ERROR_WRITE_NOT_PERMITTED => AttErrorCode::WriteNotPermitted,
            ATT_ERROR_INVALID_PDU => AttErrorCode::InvalidPdu,
            ATT_ERROR_INSUFFICIENT_AUTHENTICATION => AttErrorCode::InsufficientAuthentication,
            ATT_ERROR_REQUEST_NOT_SUPPORTED => AttErrorCode::RequestNotSupported,
            ATT_ERROR_INVALID_OFFSET => AttErrorCode::InvalidOffset,
            ATT_ERROR_INSUFFICIENT_AUTHORIZATION => AttErrorCode::InsufficientAuthorization,
            ATT_ERROR_PREPARE_QUEUE_FULL => AttErrorCode::PrepareQueueFull,
            ATT_ERROR_ATTRIBUTE_NOT_FOUND => AttErrorCode::AttributeNotFound,
            ATT_ERROR_ATTRIBUTE_NOT_LONG => AttErrorCode::AttributeNotLong,
            ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE => {
                AttErrorCode::InsufficientEncryptionKeySize
            }
            ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH => AttErrorCode::InvalidAttributeValueLength,
            ATT_ERROR_UNLIKELY => AttErrorCode::Unlikely,
            ATT_ERROR_INSUFFICIENT_ENCRYPTION => AttErrorCode::InsufficientEncryption,
            ATT_ERROR_UNSUPPORTED_GROUP_TYPE => AttErrorCode::UnsupportedGroupType,
            ATT_ERROR_INSUFFICIENT_RESOURCES => AttErrorCode::InsufficientResources,
            ATT_ERROR_DATABASE_OUT_OF_SYNC => AttErrorCode::DatabaseOutOfSync,
            ATT_ERROR_VALUE_NOT_ALLOWED => AttErrorCode::ValueNotAllowed,
            ATT_ERROR_APPLICATION_ERROR_START..=ATT_ERROR_APPLICATION_ERROR_END => {
                AttErrorCode::ApplicationError(code)
            }
            ATT_ERROR_COMMON_PROFILE_ERROR_START..=ATT_ERROR_COMMON_PROFILE_ERROR_END => {
                AttErrorCode::CommonProfileError(code)
            }
            _ => AttErrorCode::Unknown(code),
        }
    }
}

impl From<AttErrorCode> for u8 {
    fn from(code: AttErrorCode) -> u8 {
        match code {
            AttErrorCode::InvalidHandle => ATT_ERROR_INVALID_HANDLE,
            AttErrorCode::ReadNotPermitted => ATT_ERROR_READ_NOT_PERMITTED,
            AttErrorCode::WriteNotPermitted => ATT_ERROR_WRITE_NOT_PERMITTED,
            AttErrorCode::InvalidPdu => ATT_ERROR_INVALID_PDU,
            AttErrorCode::InsufficientAuthentication => ATT_ERROR_INSUFFICIENT_AUTHENTICATION,
            AttErrorCode::RequestNotSupported => ATT_ERROR_REQUEST_NOT_SUPPORTED,
            AttErrorCode::InvalidOffset => ATT_ERROR_INVALID_OFFSET,
            AttErrorCode::InsufficientAuthorization => ATT_ERROR_INSUFFICIENT_AUTHORIZATION,
            AttErrorCode::PrepareQueueFull => ATT_ERROR_PREPARE_QUEUE_FULL,
            AttErrorCode::AttributeNotFound => ATT_ERROR_ATTRIBUTE_NOT_FOUND,
            AttErrorCode::AttributeNotLong => ATT_ERROR_ATTRIBUTE_NOT_LONG,
            AttErrorCode::InsufficientEncryptionKeySize => {
                ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE
            }
            AttErrorCode::InvalidAttributeValueLength => ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH,
            AttErrorCode::Unlikely => ATT_ERROR_UNLIKELY,
            AttErrorCode::InsufficientEncryption => ATT_ERROR_INSUFFICIENT_ENCRYPTION,
            AttErrorCode::UnsupportedGroupType => ATT_ERROR_UNSUPPORTED_GROUP_TYPE,
            AttErrorCode::InsufficientResources => ATT_ERROR_INSUFFICIENT_RESOURCES,
            AttErrorCode::DatabaseOutOfSync => ATT_ERROR_DATABASE_OUT_OF_SYNC,
            AttErrorCode::ValueNotAllowed => ATT_ERROR_VALUE_NOT_ALLOWED,
            AttErrorCode::ApplicationError(code) => code,
            AttErrorCode::CommonProfileError(code) => code,
            AttErrorCode::Unknown(code) => code,
        }
    }
}

/// Errors raised while interpreting a single response PDU.
///
/// Every variant carries enough context to diagnose a misbehaving peer
/// without re-reading the frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty PDU")]
    Empty,

    #[error("PDU too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },

    #[error("unexpected PDU length: expected {expected} bytes, got {actual}")]
    UnexpectedLength { expected: usize, actual: usize },

    #[error("opcode mismatch: expected 0x{expected:02x}, got 0x{actual:02x}")]
    OpcodeMismatch { expected: u8, actual: u8 },

    #[error("PDU length {length} is not a whole number of {element_size}-byte elements")]
    LengthNotMultipleOfElementSize { length: usize, element_size: usize },

    #[error("invalid UUID size: {size} (expected 2 or 16)")]
    InvalidUuidSize { size: usize },

    #[error("invalid element size: {size} (minimum {minimum})")]
    InvalidElementSize { size: usize, minimum: usize },

    #[error("reserved handle 0x0000 at offset {offset}")]
    InvalidHandle { offset: usize },

    #[error("value is {size} bytes, not a 16-bit value")]
    ValueNotU16 { size: usize },
}

/// Decode result type
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors that abort a paginated discovery call.
#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("error response refers to opcode 0x{actual:02x}, expected 0x{expected:02x}")]
    UnexpectedErrorContext { expected: u8, actual: u8 },

    #[error("attribute server error {code:?} on handle 0x{handle:04x}")]
    AttributeServerError { code: AttErrorCode, handle: u16 },

    #[error("unexpected response opcode: expected 0x{expected:02x}, got 0x{actual:02x}")]
    UnexpectedResponseOpcode { expected: u8, actual: u8 },

    #[error("response 0x{opcode:02x} carried no elements")]
    EmptyPage { opcode: u8 },

    #[error("page ends at 0x{last:04x}, before the requested start 0x{cursor:04x}")]
    NonAdvancingPage { cursor: u16, last: u16 },

    #[error("invalid handle range 0x{start:04x}..=0x{end:04x}")]
    InvalidRange { start: u16, end: u16 },

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl PaginationError {
    /// The ATT error code reported by the peer, if this failure came from one
    pub fn att_error_code(&self) -> Option<AttErrorCode> {
        match self {
            PaginationError::AttributeServerError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Pagination result type
pub type PaginationResult<T> = Result<T, PaginationError>;
