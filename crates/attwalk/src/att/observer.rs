//! Optional hooks for watching PDUs as discovery sends and receives them
use super::pdu::{decode, Frame};
use log::{debug, log_enabled, Level};
use std::fmt::Write;

/// Receives every PDU exchanged during discovery.
///
/// Both methods default to doing nothing.
pub trait PduObserver {
    /// Called with each encoded request before it is sent
    fn on_request(&mut self, _pdu: &[u8]) {}

    /// Called with each raw response before it is decoded
    fn on_response(&mut self, _pdu: &[u8]) {}
}

/// Dumps PDUs through the `log` facade at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl LogObserver {
    fn dump(direction: &str, pdu: &[u8]) {
        debug!("{} PDU ({} bytes): {}", direction, pdu.len(), hex::encode(pdu));
        debug!("   {}", printable(pdu));
    }
}

/// Render bytes as text, escaping anything not printable ASCII as `\xNN`
pub fn printable(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b == b' ' || b.is_ascii_graphic() {
            out.push(b as char);
        } else {
            let _ = write!(out, "\\x{:02x}", b);
        }
    }
    out
}

impl PduObserver for LogObserver {
    fn on_request(&mut self, pdu: &[u8]) {
        if log_enabled!(Level::Debug) {
            Self::dump("->", pdu);
        }
    }

    fn on_response(&mut self, pdu: &[u8]) {
        if !log_enabled!(Level::Debug) {
            return;
        }
        Self::dump("<-", pdu);

        match decode(pdu) {
            Ok(Frame::Error(err)) => debug!(
                "   error {:?} in response to 0x{:02x} on handle 0x{:04x}",
                err.error_code_kind(),
                err.request_opcode,
                err.handle
            ),
            Ok(Frame::ReadByType(frame)) => {
                debug!(
                    "   elements = {}, value size = {}",
                    frame.num_elements(),
                    frame.value_size()
                );
                for i in 0..frame.num_elements() {
                    let Ok(handle) = frame.handle(i) else { continue };
                    if frame.value_size() == 2 {
                        if let Ok(value) = frame.value_u16(i) {
                            debug!("   {:04x} {:04x}", handle, value);
                        }
                    } else if let Ok(value) = frame.value(i) {
                        debug!("   {:04x} -->{}<--", handle, printable(value));
                    }
                }
            }
            Ok(Frame::ReadByGroupType(frame)) => {
                debug!(
                    "   elements = {}, value size = {}",
                    frame.num_elements(),
                    frame.value_size()
                );
                for element in frame.elements().flatten() {
                    debug!("   {}", element);
                }
            }
            Ok(Frame::Other(opcode)) => debug!("   opcode 0x{:02x}: no pretty printer", opcode),
            Err(e) => debug!("   undecodable: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::att::constants::*;

    #[test]
    fn test_printable_escapes_control_bytes() {
        assert_eq!(printable(b"Hello World"), "Hello World");
        assert_eq!(printable(&[b'A', 0x00, b'B', 0xFF]), "A\\x00B\\xff");
        assert_eq!(printable(&[]), "");
    }

    #[test]
    fn test_log_observer_accepts_any_pdu() {
        let mut observer = LogObserver;
        observer.on_request(&[ATT_READ_BY_TYPE_REQ, 0x01, 0x00, 0xFF, 0xFF, 0x00, 0x28]);
        observer.on_response(&[ATT_READ_BY_TYPE_RSP, 0x04, 0x01, 0x00, 0x00, 0x18]);
        observer.on_response(&[ATT_READ_BY_TYPE_RSP, 0x05, 0x01, 0x00, b'a', 0x07, b'c']);
        observer.on_response(&[ATT_ERROR_RSP, ATT_READ_BY_TYPE_REQ, 0x01, 0x00, 0x0A]);
        observer.on_response(&[ATT_READ_BY_GROUP_TYPE_RSP, 0x03]);
        observer.on_response(&[]);
    }
}
