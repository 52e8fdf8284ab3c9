//! The fixed 8-byte plain header every Growatt frame begins with.
//!
//! Unlike a fixed-layout binary struct cast directly from network bytes,
//! this header is small enough (four big-endian `u16` fields) that a plain
//! accessor struct over a byte slice is clearer than a `#[repr(C)]` cast, and
//! avoids committing to a particular buffer type.

use crate::{
    errors::{ProtocolError, Result},
    packet_type::PacketType,
};

/// Number of bytes in the plain (never masked) header.
pub const HEADER_LEN: usize = 8;

/// Number of trailing CRC bytes.
pub const CRC_LEN: usize = 2;

/// Parsed view of a frame's 8-byte plain header.
///
/// # Invariants
///
/// - `declared_payload_length` is read directly off the wire and is not
///   validated against the actual buffer length here; callers that need
///   that check should use [`crate::frame::RawFrame::valid_length`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Sequence number, echoed by some response types but otherwise
    /// unused for correlation (see the packet builder's fixed `seq_no`).
    pub sequence_number: u16,
    /// Protocol version. `5` and `6` are masked; all others pass through
    /// plain.
    pub protocol_version: u16,
    /// Declared length, in bytes, of everything from byte 6 up to (but not
    /// including) the CRC trailer.
    pub declared_payload_length: u16,
    /// Message type, see [`PacketType`].
    pub message_type: u16,
}

impl FrameHeader {
    /// Parses the first 8 bytes of `buf` as a plain header.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::FrameTruncated`] if `buf` is shorter than
    /// [`HEADER_LEN`].
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(ProtocolError::FrameTruncated { len: buf.len() });
        }
        Ok(Self {
            sequence_number: u16::from_be_bytes([buf[0], buf[1]]),
            protocol_version: u16::from_be_bytes([buf[2], buf[3]]),
            declared_payload_length: u16::from_be_bytes([buf[4], buf[5]]),
            message_type: u16::from_be_bytes([buf[6], buf[7]]),
        })
    }

    /// Serializes this header back to its 8-byte wire form.
    #[must_use]
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..2].copy_from_slice(&self.sequence_number.to_be_bytes());
        out[2..4].copy_from_slice(&self.protocol_version.to_be_bytes());
        out[4..6].copy_from_slice(&self.declared_payload_length.to_be_bytes());
        out[6..8].copy_from_slice(&self.message_type.to_be_bytes());
        out
    }

    /// Whether this protocol version masks its body with the XOR key.
    #[must_use]
    pub fn is_masked(&self) -> bool {
        matches!(self.protocol_version, 5 | 6)
    }

    /// The message type as a closed enum; unrecognized values map to
    /// [`PacketType::Unknown`].
    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        PacketType::from_wire(self.message_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let header = FrameHeader {
            sequence_number: 1,
            protocol_version: 6,
            declared_payload_length: 42,
            message_type: 0x0104,
        };
        let bytes = header.to_bytes();
        let parsed = FrameHeader::parse(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn rejects_short_buffer() {
        let err = FrameHeader::parse(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTruncated { len: 4 }));
    }

    #[test]
    fn masked_only_for_v5_v6() {
        let mut header = FrameHeader {
            sequence_number: 0,
            protocol_version: 1,
            declared_payload_length: 0,
            message_type: 0,
        };
        assert!(!header.is_masked());
        header.protocol_version = 5;
        assert!(header.is_masked());
        header.protocol_version = 6;
        assert!(header.is_masked());
    }
}
