//! ATT Protocol constants

// ATT opcode values used by attribute discovery
pub const ATT_ERROR_RSP: u8 = 0x01;
pub const ATT_READ_BY_TYPE_REQ: u8 = 0x08;
pub const ATT_READ_BY_TYPE_RSP: u8 = 0x09;
pub const ATT_READ_BY_GROUP_TYPE_REQ: u8 = 0x10;
pub const ATT_READ_BY_GROUP_TYPE_RSP: u8 = 0x11;

// ATT error codes
pub const ATT_ERROR_INVALID_HANDLE: u8 = 0x01;
pub const ATT_ERROR_READ_NOT_PERMITTED: u8 = 0x02;
pub const ATT_ERROR_WRITE_NOT_PERMITTED: u8 = 0x03;
pub const ATT_ERROR_INVALID_PDU: u8 = 0x04;
pub const ATT_ERROR_INSUFFICIENT_AUTHENTICATION: u8 = 0x05;
pub const ATT_ERROR_REQUEST_NOT_SUPPORTED: u8 = 0x06;
pub const ATT_ERROR_INVALID_OFFSET: u8 = 0x07;
pub const ATT_ERROR_INSUFFICIENT_AUTHORIZATION: u8 = 0x08;
pub const ATT_ERROR_PREPARE_QUEUE_FULL: u8 = 0x09;
pub const ATT_ERROR_ATTRIBUTE_NOT_FOUND: u8 = 0x0A;
pub const ATT_ERROR_ATTRIBUTE_NOT_LONG: u8 = 0x0B;
pub const ATT_ERROR_INSUFFICIENT_ENCRYPTION_KEY_SIZE: u8 = 0x0C;
pub const ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH: u8 = 0x0D;
pub const ATT_ERROR_UNLIKELY: u8 = 0x0E;
pub const ATT_ERROR_INSUFFICIENT_ENCRYPTION: u8 = 0x0F;
pub const ATT_ERROR_UNSUPPORTED_GROUP_TYPE: u8 = 0x10;
pub const ATT_ERROR_INSUFFICIENT_RESOURCES: u8 = 0x11;
pub const ATT_ERROR_DATABASE_OUT_OF_SYNC: u8 = 0x12;
pub const ATT_ERROR_VALUE_NOT_ALLOWED: u8 = 0x13;
pub const ATT_ERROR_APPLICATION_ERROR_START: u8 = 0x80;
pub const ATT_ERROR_APPLICATION_ERROR_END: u8 = 0x9F;
pub const ATT_ERROR_COMMON_PROFILE_ERROR_START: u8 = 0xE0;
pub const ATT_ERROR_COMMON_PROFILE_ERROR_END: u8 = 0xFF;

// ATT handle values
pub const ATT_HANDLE_RESERVED: u16 = 0x0000;
pub const ATT_HANDLE_MIN: u16 = 0x0001;
pub const ATT_HANDLE_MAX: u16 = 0xFFFF;

/// Default ATT MTU on an LE link, also the default receive buffer size.
pub const ATT_DEFAULT_MTU: usize = 23;

// PDU layout
pub const ATT_ERROR_RSP_LEN: usize = 5;
/// Opcode (1) + element size (1)
pub const ATT_LIST_RSP_HEADER_LEN: usize = 2;
/// Handle (2) + at least one value byte
pub const ATT_READ_BY_TYPE_MIN_ELEMENT: usize = 3;
/// Start handle (2) + end handle (2)
pub const ATT_READ_BY_GROUP_MIN_ELEMENT: usize = 4;

// UUID widths legal on the wire
pub const UUID16_LEN: usize = 2;
pub const UUID128_LEN: usize = 16;
