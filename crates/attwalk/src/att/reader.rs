//! Bounds-checked access to a received PDU
use super::constants::{ATT_HANDLE_RESERVED, UUID128_LEN, UUID16_LEN};
use super::error::{DecodeError, DecodeResult};
use crate::uuid::Uuid;
use byteorder::{ByteOrder, LittleEndian};
use std::ops::Range;

/// Read-only view over one raw PDU.
///
/// All reads are offset based and fail with [`DecodeError::TooShort`]
/// instead of indexing past the end of the frame.
#[derive(Debug, Clone, Copy)]
pub struct PduReader<'a> {
    data: &'a [u8],
}

impl<'a> PduReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn require_len(&self, needed: usize) -> DecodeResult<()> {
        if self.data.len() < needed {
            return Err(DecodeError::TooShort {
                needed,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> DecodeResult<u8> {
        self.data
            .get(offset)
            .copied()
            .ok_or(DecodeError::TooShort {
                needed: offset + 1,
                actual: self.data.len(),
            })
    }

    pub fn read_u16_le(&self, offset: usize) -> DecodeResult<u16> {
        let bytes = self.read_slice(offset..offset + 2)?;
        Ok(LittleEndian::read_u16(bytes))
    }

    /// Read an attribute handle, rejecting the reserved handle 0x0000
    pub fn read_handle(&self, offset: usize) -> DecodeResult<u16> {
        let handle = self.read_u16_le(offset)?;
        if handle == ATT_HANDLE_RESERVED {
            return Err(DecodeError::InvalidHandle { offset });
        }
        Ok(handle)
    }

    /// Read a 2 or 16 byte UUID
    pub fn read_uuid(&self, offset: usize, size: usize) -> DecodeResult<Uuid> {
        match size {
            UUID16_LEN | UUID128_LEN => {
                let bytes = self.read_slice(offset..offset + size)?;
                Uuid::from_bytes(bytes).ok_or(DecodeError::InvalidUuidSize { size })
            }
            _ => Err(DecodeError::InvalidUuidSize { size }),
        }
    }

    pub fn read_slice(&self, range: Range<usize>) -> DecodeResult<&'a [u8]> {
        self.data.get(range.clone()).ok_or(DecodeError::TooShort {
            needed: range.end,
            actual: self.data.len(),
        })
    }
}
