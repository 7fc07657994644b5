//! Bluetooth UUIDs as they appear in ATT PDUs
//!
//! Attribute discovery only ever sees two UUID widths on the wire: the
//! 16-bit SIG-assigned short form and the full 128-bit form. Both are kept
//! exactly as received (little-endian), with no expansion against the base
//! UUID.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::att::constants::{UUID128_LEN, UUID16_LEN};

/// UUID of an attribute type or group type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uuid {
    /// 16-bit SIG-assigned UUID
    Uuid16(u16),
    /// 128-bit UUID, little-endian as on the wire
    Uuid128([u8; 16]),
}

impl Uuid {
    /// Primary service declaration
    pub const PRIMARY_SERVICE: Uuid = Uuid::Uuid16(0x2800);
    /// Secondary service declaration
    pub const SECONDARY_SERVICE: Uuid = Uuid::Uuid16(0x2801);
    /// Include declaration
    pub const INCLUDE: Uuid = Uuid::Uuid16(0x2802);
    /// Characteristic declaration
    pub const CHARACTERISTIC: Uuid = Uuid::Uuid16(0x2803);
    /// Characteristic user description descriptor
    pub const CHAR_USER_DESCRIPTION: Uuid = Uuid::Uuid16(0x2901);
    /// Client characteristic configuration descriptor
    pub const CLIENT_CHAR_CONFIG: Uuid = Uuid::Uuid16(0x2902);

    /// Convert raw little-endian bytes to a UUID based on length.
    ///
    /// Only 2 and 16 byte slices are legal.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes.len() {
            UUID16_LEN => Some(Uuid::Uuid16(u16::from_le_bytes([bytes[0], bytes[1]]))),
            UUID128_LEN => {
                let mut uuid = [0u8; 16];
                uuid.copy_from_slice(bytes);
                Some(Uuid::Uuid128(uuid))
            }
            _ => None,
        }
    }

    /// Create a 128-bit UUID from its numeric value
    pub fn from_u128(uuid: u128) -> Self {
        Uuid::Uuid128(uuid.to_le_bytes())
    }

    /// Little-endian wire bytes of this UUID
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            Uuid::Uuid16(uuid) => uuid.to_le_bytes().to_vec(),
            Uuid::Uuid128(uuid) => uuid.to_vec(),
        }
    }

    /// Get the 16-bit value if this is a 16-bit UUID
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Uuid::Uuid16(uuid) => Some(*uuid),
            Uuid::Uuid128(_) => None,
        }
    }

    /// Number of bytes this UUID occupies on the wire
    pub fn wire_len(&self) -> usize {
        match self {
            Uuid::Uuid16(_) => UUID16_LEN,
            Uuid::Uuid128(_) => UUID128_LEN,
        }
    }
}

impl From<u16> for Uuid {
    fn from(uuid: u16) -> Self {
        Uuid::Uuid16(uuid)
    }
}

impl From<[u8; 16]> for Uuid {
    /// Assumes bytes are in little-endian order.
    fn from(bytes: [u8; 16]) -> Self {
        Uuid::Uuid128(bytes)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uuid::Uuid16(uuid) => write!(f, "{:04x}", uuid),
            Uuid::Uuid128(bytes) => {
                // Hyphenated text form is big-endian
                let mut b = *bytes;
                b.reverse();
                write!(
                    f,
                    "{}-{}-{}-{}-{}",
                    hex::encode(&b[0..4]),
                    hex::encode(&b[4..6]),
                    hex::encode(&b[6..8]),
                    hex::encode(&b[8..10]),
                    hex::encode(&b[10..16])
                )
            }
        }
    }
}

/// Errors from parsing a UUID string
#[derive(Debug, Error)]
pub enum UuidParseError {
    #[error("invalid UUID length: {0} hex digits (expected 4 or 32)")]
    InvalidLength(usize),

    #[error("invalid UUID format")]
    InvalidFormat,

    #[error("invalid hex in UUID: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl FromStr for Uuid {
    type Err = UuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        if s.chars().any(|c| !(c.is_ascii_hexdigit() || c == '-')) {
            return Err(UuidParseError::InvalidFormat);
        }
        let cleaned: String = s.chars().filter(|c| *c != '-').collect();

        match cleaned.len() {
            4 => {
                let mut be = [0u8; 2];
                hex::decode_to_slice(&cleaned, &mut be)?;
                Ok(Uuid::Uuid16(u16::from_be_bytes(be)))
            }
            32 => {
                let mut bytes = [0u8; 16];
                hex::decode_to_slice(&cleaned, &mut bytes)?;
                bytes.reverse();
                Ok(Uuid::Uuid128(bytes))
            }
            n => Err(UuidParseError::InvalidLength(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_declarations() {
        assert_eq!(Uuid::SECONDARY_SERVICE.as_u16(), Some(0x2801));
        assert_eq!(Uuid::INCLUDE.to_string(), "2802");
        assert_eq!(Uuid::CHAR_USER_DESCRIPTION.as_bytes(), vec![0x01, 0x29]);
        assert_eq!("0x2902".parse::<Uuid>().unwrap(), Uuid::CLIENT_CHAR_CONFIG);
        assert_eq!(Uuid::from_u128(1).as_u16(), None);
    }

    #[test]
    fn test_from_bytes_widths() {
        assert_eq!(Uuid::from_bytes(&[0x00, 0x28]), Some(Uuid::PRIMARY_SERVICE));
        assert_eq!(Uuid::from_bytes(&[0u8; 16]), Some(Uuid::Uuid128([0u8; 16])));
        assert_eq!(Uuid::from_bytes(&[0u8; 4]), None);
        assert_eq!(Uuid::from_bytes(&[0u8; 3]), None);
        assert_eq!(Uuid::from_bytes(&[]), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Uuid::PRIMARY_SERVICE.to_string(), "2800");

        let uuid = Uuid::from_u128(0x0000180a_0000_1000_8000_00805f9b34fb);
        assert_eq!(uuid.to_string(), "0000180a-0000-1000-8000-00805f9b34fb");
    }

    #[test]
    fn test_parse() {
        assert_eq!("2800".parse::<Uuid>().unwrap(), Uuid::PRIMARY_SERVICE);
        assert_eq!("0x2803".parse::<Uuid>().unwrap(), Uuid::CHARACTERISTIC);

        let parsed: Uuid = "0000180a-0000-1000-8000-00805f9b34fb".parse().unwrap();
        assert_eq!(parsed, Uuid::from_u128(0x0000180a_0000_1000_8000_00805f9b34fb));
        assert_eq!(parsed.as_bytes()[0], 0xfb);

        assert!(matches!(
            "123".parse::<Uuid>(),
            Err(UuidParseError::InvalidLength(3))
        ));
        assert!(matches!(
            "28zz".parse::<Uuid>(),
            Err(UuidParseError::InvalidFormat)
        ));
    }
}
