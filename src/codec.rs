//! Frame encoding and reply decoding.
//!
//! Requests are always `A5 5A <id> <value>`. Replies share the magic prefix;
//! `A5 5A 30 <v1> <v2>` carries the two potentiometer readings and
//! `A5 5A 40 'O' 'K'` acknowledges a command. A single read can contain a
//! telemetry reply followed by the acknowledgement.

use std::fmt::Write;

use crate::constants::*;
use crate::types::Telemetry;

/// A 4-byte request frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame([u8; FRAME_LEN]);

impl CommandFrame {
    pub fn new(command_id: u8, value: u8) -> Self {
        CommandFrame([MAGIC_0, MAGIC_1, command_id, value])
    }

    pub fn command_id(&self) -> u8 {
        self.0[2]
    }

    pub fn value(&self) -> u8 {
        self.0[3]
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }
}

/// How a received buffer was interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Telemetry(Telemetry),
    Ack,
    Other { id: u8 },
    Unrecognized,
}

/// Encode a request frame
pub fn encode(command_id: u8, value: u8) -> [u8; FRAME_LEN] {
    *CommandFrame::new(command_id, value).as_bytes()
}

fn has_magic(bytes: &[u8]) -> bool {
    bytes.len() > 2 && bytes[0] == MAGIC_0 && bytes[1] == MAGIC_1
}

/// Extract telemetry from a received buffer.
///
/// `bytes` must already be truncated to the number of bytes read. Returns
/// `None` for anything that is not a complete telemetry reply.
pub fn decode_telemetry(bytes: &[u8]) -> Option<Telemetry> {
    if !has_magic(bytes) || bytes[2] != TELEMETRY_REPLY {
        return None;
    }
    match (
        bytes.get(TELEMETRY_FIRST_OFFSET),
        bytes.get(TELEMETRY_SECOND_OFFSET),
    ) {
        (Some(&first), Some(&second)) => Some(Telemetry { first, second }),
        _ => None,
    }
}

/// Classify a received buffer for logging
pub fn classify(bytes: &[u8]) -> Reply {
    if !has_magic(bytes) {
        return Reply::Unrecognized;
    }
    if let Some(telemetry) = decode_telemetry(bytes) {
        return Reply::Telemetry(telemetry);
    }
    match bytes[2] {
        ACK_REPLY if bytes[3..].starts_with(ACK_PAYLOAD) => Reply::Ack,
        id => Reply::Other { id },
    }
}

/// Render bytes as lowercase two-digit hex, each followed by a space
pub fn to_hex(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 3);
    for b in bytes {
        let _ = write!(hex, "{:02x} ", b);
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        for (id, value) in [
            (0x10, 0x00),
            (0x30, 100),
            (0x01, 1),
            (0x02, 0),
            (0xFF, 0xFF),
        ] {
            assert_eq!(encode(id, value), [0xA5, 0x5A, id, value]);
        }
        let frame = CommandFrame::new(0x30, 55);
        assert_eq!(frame.command_id(), 0x30);
        assert_eq!(frame.value(), 55);
    }

    #[test]
    fn test_short_buffers_never_decode() {
        assert_eq!(decode_telemetry(&[]), None);
        assert_eq!(decode_telemetry(&[0xA5]), None);
        assert_eq!(decode_telemetry(&[0xA5, 0x5A]), None);
        assert_eq!(classify(&[0xA5, 0x5A]), Reply::Unrecognized);
    }

    #[test]
    fn test_wrong_magic_never_decodes() {
        assert_eq!(decode_telemetry(&[0x5A, 0xA5, 0x30, 1, 2]), None);
        assert_eq!(decode_telemetry(&[0xA5, 0x00, 0x30, 1, 2]), None);
        assert_eq!(classify(&[0x00, 0x5A, 0x30, 1, 2]), Reply::Unrecognized);
    }

    #[test]
    fn test_truncated_telemetry_is_ignored() {
        assert_eq!(decode_telemetry(&[0xA5, 0x5A, 0x30]), None);
        assert_eq!(decode_telemetry(&[0xA5, 0x5A, 0x30, 0x07]), None);
        assert_eq!(
            classify(&[0xA5, 0x5A, 0x30, 0x07]),
            Reply::Other { id: 0x30 }
        );
    }

    #[test]
    fn test_telemetry_values_pass_through() {
        assert_eq!(
            decode_telemetry(&[0xA5, 0x5A, 0x30, 0x07, 0x64]),
            Some(Telemetry {
                first: 7,
                second: 100,
            })
        );
        assert_eq!(
            decode_telemetry(&[0xA5, 0x5A, 0x30, 0x00, 0xFF]),
            Some(Telemetry {
                first: 0,
                second: 255,
            })
        );
    }

    #[test]
    fn test_telemetry_followed_by_ack() {
        let bytes = [
            0xA5, 0x5A, 0x30, 0x80, 0x10, 0xA5, 0x5A, 0x40, b'O', b'K',
        ];
        assert_eq!(
            classify(&bytes),
            Reply::Telemetry(Telemetry {
                first: 0x80,
                second: 0x10,
            })
        );
    }

    #[test]
    fn test_classify_ack_and_other() {
        assert_eq!(classify(&[0xA5, 0x5A, 0x40, b'O', b'K']), Reply::Ack);
        assert_eq!(
            classify(&[0xA5, 0x5A, 0x40, b'N']),
            Reply::Other { id: 0x40 }
        );
        assert_eq!(
            classify(&[0xA5, 0x5A, 0x11, 0x00]),
            Reply::Other { id: 0x11 }
        );
    }

    #[test]
    fn test_hex_rendering() {
        assert_eq!(to_hex(&[0xA5, 0x5A, 0x30, 0x07, 0x64]), "a5 5a 30 07 64 ");
        assert_eq!(to_hex(&[]), "");
        assert_eq!(to_hex(&[0x0F]), "0f ");
    }
}
