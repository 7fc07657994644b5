//! Request PDU encoding for discovery
use super::constants::*;
use crate::uuid::Uuid;

fn encode_range_request(opcode: u8, start_handle: u16, end_handle: u16, uuid: &Uuid) -> Vec<u8> {
    let mut packet = Vec::with_capacity(5 + uuid.wire_len());

    packet.push(opcode);
    packet.extend_from_slice(&start_handle.to_le_bytes());
    packet.extend_from_slice(&end_handle.to_le_bytes());
    packet.extend_from_slice(&uuid.as_bytes());

    packet
}

/// Encode a Read By Type Request for `[start_handle, end_handle]`
pub fn encode_read_by_type_request(start_handle: u16, end_handle: u16, uuid: &Uuid) -> Vec<u8> {
    encode_range_request(ATT_READ_BY_TYPE_REQ, start_handle, end_handle, uuid)
}

/// Encode a Read By Group Type Request for `[start_handle, end_handle]`
pub fn encode_read_by_group_request(start_handle: u16, end_handle: u16, uuid: &Uuid) -> Vec<u8> {
    encode_range_request(ATT_READ_BY_GROUP_TYPE_REQ, start_handle, end_handle, uuid)
}
