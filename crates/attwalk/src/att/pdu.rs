//! Response PDU decoding
//!
//! A received frame is classified once by its opcode into a closed set of
//! variants. Each variant validates its layout when it is constructed, so
//! the per-element accessors only have to check the element index.

use super::constants::*;
use super::error::{AttErrorCode, DecodeError, DecodeResult};
use super::reader::PduReader;
use super::types::{ReadByGroupElement, ReadByTypeElement};
use crate::uuid::Uuid;

/// A response PDU that can be decoded from raw bytes
pub trait ResponsePdu<'a>: Sized {
    /// Opcode for this PDU
    fn opcode() -> u8;

    /// Parse the PDU, validating opcode and layout
    fn parse(data: &'a [u8]) -> DecodeResult<Self>;
}

/// A decoded response frame
#[derive(Debug, Clone, Copy)]
pub enum Frame<'a> {
    Error(ErrorFrame),
    ReadByType(ReadByTypeFrame<'a>),
    ReadByGroupType(ReadByGroupTypeFrame<'a>),
    /// Any opcode discovery does not interpret
    Other(u8),
}

impl Frame<'_> {
    pub fn opcode(&self) -> u8 {
        match self {
            Frame::Error(_) => ATT_ERROR_RSP,
            Frame::ReadByType(_) => ATT_READ_BY_TYPE_RSP,
            Frame::ReadByGroupType(_) => ATT_READ_BY_GROUP_TYPE_RSP,
            Frame::Other(opcode) => *opcode,
        }
    }
}

/// Decode a frame by dispatching on its opcode
pub fn decode(data: &[u8]) -> DecodeResult<Frame<'_>> {
    let opcode = *data.first().ok_or(DecodeError::Empty)?;

    match opcode {
        ATT_ERROR_RSP => ErrorFrame::parse(data).map(Frame::Error),
        ATT_READ_BY_TYPE_RSP => ReadByTypeFrame::parse(data).map(Frame::ReadByType),
        ATT_READ_BY_GROUP_TYPE_RSP => {
            ReadByGroupTypeFrame::parse(data).map(Frame::ReadByGroupType)
        }
        other => Ok(Frame::Other(other)),
    }
}

/// Decode a frame as a specific variant.
///
/// Fails with [`DecodeError::OpcodeMismatch`] before looking past the
/// opcode byte if the frame is of a different kind.
pub fn decode_as<'a, V: ResponsePdu<'a>>(data: &'a [u8]) -> DecodeResult<V> {
    check_opcode(data, V::opcode())?;
    V::parse(data)
}

fn check_opcode(data: &[u8], expected: u8) -> DecodeResult<()> {
    let actual = *data.first().ok_or(DecodeError::Empty)?;
    if actual != expected {
        return Err(DecodeError::OpcodeMismatch { expected, actual });
    }
    Ok(())
}

/// Validate the shared `opcode · element_size · elements` layout and return
/// the element size.
fn check_list_layout(reader: &PduReader<'_>, minimum: usize) -> DecodeResult<usize> {
    reader.require_len(ATT_LIST_RSP_HEADER_LEN)?;

    let element_size = reader.read_u8(1)? as usize;
    if element_size < minimum {
        return Err(DecodeError::InvalidElementSize {
            size: element_size,
            minimum,
        });
    }

    let payload = reader.len() - ATT_LIST_RSP_HEADER_LEN;
    if payload % element_size != 0 {
        return Err(DecodeError::LengthNotMultipleOfElementSize {
            length: reader.len(),
            element_size,
        });
    }

    Ok(element_size)
}

/// Offset of a `width`-byte field at `field` within element `i`.
///
/// An index past the last whole element is a read beyond the buffer.
fn element_field_offset(
    reader: &PduReader<'_>,
    element_size: usize,
    i: usize,
    field: usize,
    width: usize,
) -> DecodeResult<usize> {
    let offset = i
        .saturating_mul(element_size)
        .saturating_add(ATT_LIST_RSP_HEADER_LEN + field);
    let count = (reader.len() - ATT_LIST_RSP_HEADER_LEN) / element_size;
    if i >= count {
        return Err(DecodeError::TooShort {
            needed: offset.saturating_add(width),
            actual: reader.len(),
        });
    }
    Ok(offset)
}

/// Error Response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorFrame {
    /// Opcode of the request that failed
    pub request_opcode: u8,
    /// Handle in error; 0x0000 when the error does not concern a handle
    pub handle: u16,
    /// Raw error code
    pub error_code: u8,
}

impl ErrorFrame {
    /// Typed view of the error code
    pub fn error_code_kind(&self) -> AttErrorCode {
        self.error_code.into()
    }

    pub fn is_attribute_not_found(&self) -> bool {
        self.error_code == ATT_ERROR_ATTRIBUTE_NOT_FOUND
    }
}

impl<'a> ResponsePdu<'a> for ErrorFrame {
    fn opcode() -> u8 {
        ATT_ERROR_RSP
    }

    fn parse(data: &'a [u8]) -> DecodeResult<Self> {
        check_opcode(data, Self::opcode())?;

        let reader = PduReader::new(data);
        reader.require_len(ATT_ERROR_RSP_LEN)?;
        if reader.len() != ATT_ERROR_RSP_LEN {
            return Err(DecodeError::UnexpectedLength {
                expected: ATT_ERROR_RSP_LEN,
                actual: reader.len(),
            });
        }

        Ok(Self {
            request_opcode: reader.read_u8(1)?,
            handle: reader.read_u16_le(2)?,
            error_code: reader.read_u8(4)?,
        })
    }
}

/// Read By Type Response
#[derive(Debug, Clone, Copy)]
pub struct ReadByTypeFrame<'a> {
    reader: PduReader<'a>,
    element_size: usize,
}

impl<'a> ResponsePdu<'a> for ReadByTypeFrame<'a> {
    fn opcode() -> u8 {
        ATT_READ_BY_TYPE_RSP
    }

    fn parse(data: &'a [u8]) -> DecodeResult<Self> {
        check_opcode(data, Self::opcode())?;

        let reader = PduReader::new(data);
        let element_size = check_list_layout(&reader, ATT_READ_BY_TYPE_MIN_ELEMENT)?;

        Ok(Self {
            reader,
            element_size,
        })
    }
}

impl<'a> ReadByTypeFrame<'a> {
    /// Size of one handle-value pair
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Size of each value
    pub fn value_size(&self) -> usize {
        self.element_size - 2
    }

    pub fn num_elements(&self) -> usize {
        (self.reader.len() - ATT_LIST_RSP_HEADER_LEN) / self.element_size
    }

    fn field_offset(&self, i: usize, field: usize, width: usize) -> DecodeResult<usize> {
        element_field_offset(&self.reader, self.element_size, i, field, width)
    }

    pub fn handle(&self, i: usize) -> DecodeResult<u16> {
        let offset = self.field_offset(i, 0, 2)?;
        self.reader.read_handle(offset)
    }

    pub fn value(&self, i: usize) -> DecodeResult<&'a [u8]> {
        let start = self.field_offset(i, 2, self.value_size())?;
        self.reader.read_slice(start..start + self.value_size())
    }

    /// The value read as a little-endian u16, for 2-byte values
    pub fn value_u16(&self, i: usize) -> DecodeResult<u16> {
        if self.value_size() != 2 {
            return Err(DecodeError::ValueNotU16 {
                size: self.value_size(),
            });
        }
        let offset = self.field_offset(i, 2, 2)?;
        self.reader.read_u16_le(offset)
    }

    pub fn element(&self, i: usize) -> DecodeResult<ReadByTypeElement> {
        Ok(ReadByTypeElement {
            handle: self.handle(i)?,
            value: self.value(i)?.to_vec(),
        })
    }

    pub fn elements(&self) -> impl Iterator<Item = DecodeResult<ReadByTypeElement>> + 'a {
        let frame = *self;
        (0..frame.num_elements()).map(move |i| frame.element(i))
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.reader.bytes()
    }
}

/// Read By Group Type Response
#[derive(Debug, Clone, Copy)]
pub struct ReadByGroupTypeFrame<'a> {
    reader: PduReader<'a>,
    element_size: usize,
}

impl<'a> ResponsePdu<'a> for ReadByGroupTypeFrame<'a> {
    fn opcode() -> u8 {
        ATT_READ_BY_GROUP_TYPE_RSP
    }

    fn parse(data: &'a [u8]) -> DecodeResult<Self> {
        check_opcode(data, Self::opcode())?;

        let reader = PduReader::new(data);
        let element_size = check_list_layout(&reader, ATT_READ_BY_GROUP_MIN_ELEMENT)?;

        let value_size = element_size - 4;
        if value_size != UUID16_LEN && value_size != UUID128_LEN {
            return Err(DecodeError::InvalidUuidSize { size: value_size });
        }

        Ok(Self {
            reader,
            element_size,
        })
    }
}

impl<'a> ReadByGroupTypeFrame<'a> {
    /// Size of one group entry
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Size of the group type UUID, 2 or 16
    pub fn value_size(&self) -> usize {
        self.element_size - 4
    }

    pub fn num_elements(&self) -> usize {
        (self.reader.len() - ATT_LIST_RSP_HEADER_LEN) / self.element_size
    }

    fn field_offset(&self, i: usize, field: usize, width: usize) -> DecodeResult<usize> {
        element_field_offset(&self.reader, self.element_size, i, field, width)
    }

    pub fn start_handle(&self, i: usize) -> DecodeResult<u16> {
        let offset = self.field_offset(i, 0, 2)?;
        self.reader.read_handle(offset)
    }

    pub fn end_handle(&self, i: usize) -> DecodeResult<u16> {
        let offset = self.field_offset(i, 2, 2)?;
        self.reader.read_handle(offset)
    }

    pub fn uuid(&self, i: usize) -> DecodeResult<Uuid> {
        let offset = self.field_offset(i, 4, self.value_size())?;
        self.reader.read_uuid(offset, self.value_size())
    }

    pub fn element(&self, i: usize) -> DecodeResult<ReadByGroupElement> {
        Ok(ReadByGroupElement {
            start_handle: self.start_handle(i)?,
            end_handle: self.end_handle(i)?,
            group_type: self.uuid(i)?,
        })
    }

    pub fn elements(&self) -> impl Iterator<Item = DecodeResult<ReadByGroupElement>> + 'a {
        let frame = *self;
        (0..frame.num_elements()).map(move |i| frame.element(i))
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.reader.bytes()
    }
}
