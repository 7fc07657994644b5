//! Decoded discovery elements
use crate::uuid::Uuid;
use std::fmt;

/// Handle and value from a Read By Type Response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadByTypeElement {
    /// Attribute handle
    pub handle: u16,
    /// Attribute value, fixed width within one response
    pub value: Vec<u8>,
}

/// One group from a Read By Group Type Response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadByGroupElement {
    /// First handle of the group
    pub start_handle: u16,
    /// Last handle of the group
    pub end_handle: u16,
    /// Group type value, e.g. the service UUID
    pub group_type: Uuid,
}

impl fmt::Display for ReadByTypeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}: {}", self.handle, hex::encode(&self.value))
    }
}

impl fmt::Display for ReadByGroupElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:04x}, {:04x}] {}",
            self.start_handle, self.end_handle, self.group_type
        )
    }
}
