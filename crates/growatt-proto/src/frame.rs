//! `RawFrame`: the immutable byte view of a frame as read off the wire,
//! plus lazy, memoized decryption.

use std::cell::OnceCell;

use bytes::Bytes;

use crate::{
    crc::modbus16,
    errors::{ProtocolError, Result},
    header::{CRC_LEN, FrameHeader, HEADER_LEN},
    mask::xor_mask,
    packet_type::PacketType,
};

/// An immutable view over a complete frame's bytes.
///
/// # Invariants
///
/// A frame is *well-formed* iff `len(bytes) == 8 + declared_payload_length +
/// 2` and the trailing CRC matches `modbus16` over everything before it.
/// Neither condition is checked by [`RawFrame::parse`] itself — it only
/// slices the header, which never fails. Use [`RawFrame::valid_length`] and
/// [`RawFrame::valid_crc`] to check well-formedness before trusting the
/// body.
#[derive(Debug, Clone)]
pub struct RawFrame {
    bytes: Bytes,
    header: FrameHeader,
    decrypted: OnceCell<Bytes>,
}

impl RawFrame {
    /// Parses `bytes` into a raw frame.
    ///
    /// Constant-time header slicing; never fails on the frame's content,
    /// only on a buffer too short to hold a header and CRC trailer at all.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::FrameTruncated`] if `bytes` is shorter than
    /// [`HEADER_LEN`] + [`CRC_LEN`].
    pub fn parse(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() < HEADER_LEN + CRC_LEN {
            return Err(ProtocolError::FrameTruncated { len: bytes.len() });
        }
        let header = FrameHeader::parse(&bytes)?;
        Ok(Self { bytes, header, decrypted: OnceCell::new() })
    }

    /// The parsed header.
    #[must_use]
    pub fn header(&self) -> FrameHeader {
        self.header
    }

    /// The complete wire bytes, header through CRC trailer.
    #[must_use]
    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// The message type. Never fails; unrecognized wire values are
    /// [`PacketType::Unknown`].
    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        self.header.packet_type()
    }

    /// Body bytes between the header and the CRC trailer, still masked if
    /// the protocol version requires it.
    fn raw_body(&self) -> &[u8] {
        let end = self.bytes.len() - CRC_LEN;
        &self.bytes[HEADER_LEN..end]
    }

    /// Whether the trailing CRC matches `modbus16` over everything before
    /// it. The CRC is computed over the raw, still-masked bytes — masking
    /// never affects the header or the CRC itself.
    #[must_use]
    pub fn valid_crc(&self) -> bool {
        let split = self.bytes.len() - CRC_LEN;
        let expected = modbus16(&self.bytes[..split]);
        let trailing = u16::from_be_bytes([self.bytes[split], self.bytes[split + 1]]);
        expected == trailing
    }

    /// Whether the declared payload length (bytes 4..6) matches the actual
    /// number of body bytes between the message type and the CRC trailer.
    ///
    /// The declared length counts from byte 6 (the message type field)
    /// through the byte before the CRC, so it is two bytes larger than
    /// [`RawFrame::raw_body`]'s length.
    #[must_use]
    pub fn valid_length(&self) -> bool {
        let body_and_type_len = self.bytes.len() - HEADER_LEN - CRC_LEN + 2;
        usize::from(self.header.declared_payload_length) == body_and_type_len
    }

    /// True iff both [`RawFrame::valid_length`] and [`RawFrame::valid_crc`]
    /// hold.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.valid_length() && self.valid_crc()
    }

    /// Returns the decrypted body, computing and memoizing it on first
    /// access.
    ///
    /// If the protocol version is not 5 or 6, the body is returned
    /// unchanged (nothing to unmask). Masking is an involution, so running
    /// this twice on an already-decrypted buffer would re-mask it — callers
    /// must not call it on a buffer that has already been through here.
    #[must_use]
    pub fn decrypted_body(&self) -> &Bytes {
        self.decrypted.get_or_init(|| {
            if !self.header.is_masked() {
                return Bytes::copy_from_slice(self.raw_body());
            }
            let mut body = self.raw_body().to_vec();
            xor_mask(&mut body);
            Bytes::from(body)
        })
    }

    /// Datalogger serial: 10 ASCII bytes at decrypted offset 0..10, i.e. the
    /// first 10 bytes of the body.
    #[must_use]
    pub fn datalogger_serial(&self) -> Option<String> {
        let body = self.decrypted_body();
        if body.len() < 10 {
            return None;
        }
        String::from_utf8(body[0..10].to_vec()).ok()
    }

    /// Inverter serial, present only for frame types that carry one and
    /// located by protocol-version rule: bytes 18..28 for version 5, bytes
    /// 38..48 for version 6.
    #[must_use]
    pub fn inverter_serial(&self) -> Option<String> {
        if !self.packet_type().carries_registers() {
            return None;
        }
        let (start, end) = match self.header.protocol_version {
            5 => (18, 28),
            6 => (38, 48),
            _ => return None,
        };
        let body = self.decrypted_body();
        if body.len() < end {
            return None;
        }
        String::from_utf8(body[start..end].to_vec()).ok()
    }
}
