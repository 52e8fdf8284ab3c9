//! Outbound packet construction: holding-register reads and writes the
//! proxy issues to a datalogger, in protocol versions 5 and 6.

use crate::{crc::modbus16, mask::xor_mask, packet_type::PacketType};

/// Fixed sequence number used for every outbound packet.
///
/// The source assigns a random sequence number per request; this proxy
/// fixes it at `1` since nothing here correlates responses by sequence
/// number (see [`PacketType::carries_registers`] and the dispatch layer's
/// correlation-by-packet-type).
pub const SEQUENCE_NUMBER: u16 = 1;

/// Which holding-register operation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read `reg_len` consecutive registers starting at `address`.
    Read {
        /// First register to read.
        address: u16,
        /// Number of consecutive registers to read.
        reg_len: u16,
    },
    /// Write `value` to the single register at `address`.
    Set {
        /// Register to write.
        address: u16,
        /// Value to write.
        value: u16,
    },
}

impl Operation {
    fn packet_type(self) -> PacketType {
        match self {
            Self::Read { .. } => PacketType::RegisterRead,
            Self::Set { .. } => PacketType::RegisterSet,
        }
    }

    fn address(self) -> u16 {
        match self {
            Self::Read { address, .. } | Self::Set { address, .. } => address,
        }
    }

    /// The "registers requested" field: the read length for a read, or the
    /// value being written for a set (the source reuses this field for
    /// both, calling it `reg_length` in each case).
    fn reg_field(self) -> u16 {
        match self {
            Self::Read { reg_len, .. } => reg_len,
            Self::Set { value, .. } => value,
        }
    }
}

/// Builds an outbound holding-register request packet addressed to a
/// specific datalogger.
///
/// # Invariants
///
/// - `protocol_version` must be `5` or `6`; any other value is padded like
///   version 5 (one zero byte), matching the source's only two supported
///   subclasses.
/// - The sequence number is always [`SEQUENCE_NUMBER`].
/// - Protocol versions 5 and 6 mask the serial/pad/address/register-count
///   body before the CRC is computed, matching [`crate::mask::xor_mask`].
#[must_use]
pub fn build_register_packet(logger_sn: &str, protocol_version: u16, operation: Operation) -> Vec<u8> {
    let pad_len: usize = if protocol_version == 6 { 20 } else { 1 };
    let serial = logger_sn.as_bytes();
    let pad = vec![0u8; pad_len];
    let address = operation.address().to_be_bytes();
    let reg_field = operation.reg_field().to_be_bytes();

    let mut body = Vec::with_capacity(serial.len() + pad.len() + 4);
    body.extend_from_slice(serial);
    body.extend_from_slice(&pad);
    body.extend_from_slice(&address);
    body.extend_from_slice(&reg_field);

    if matches!(protocol_version, 5 | 6) {
        xor_mask(&mut body);
    }

    // declared_payload_length counts from the message-type field through
    // the end of body: 2 (type) + body.len().
    let declared_payload_length = (body.len() + 2) as u16;

    let mut packet = Vec::with_capacity(8 + body.len() + 2);
    packet.extend_from_slice(&SEQUENCE_NUMBER.to_be_bytes());
    packet.extend_from_slice(&protocol_version.to_be_bytes());
    packet.extend_from_slice(&declared_payload_length.to_be_bytes());
    packet.extend_from_slice(&operation.packet_type().to_wire().to_be_bytes());
    packet.extend_from_slice(&body);

    let crc = modbus16(&packet);
    packet.extend_from_slice(&crc.to_be_bytes());
    packet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RawFrame;

    #[test]
    fn read_v5_round_trips_through_raw_frame() {
        let packet =
            build_register_packet("LOGGERSN01", 5, Operation::Read { address: 0, reg_len: 125 });
        let frame = RawFrame::parse(packet).unwrap();
        assert!(frame.is_well_formed());
        assert_eq!(frame.packet_type(), PacketType::RegisterRead);
        assert_eq!(frame.header().sequence_number, SEQUENCE_NUMBER);
    }

    #[test]
    fn set_v6_round_trips_through_raw_frame() {
        let packet = build_register_packet("LOGGERSN01", 6, Operation::Set { address: 45, value: 1 });
        let frame = RawFrame::parse(packet).unwrap();
        assert!(frame.is_well_formed());
        assert_eq!(frame.packet_type(), PacketType::RegisterSet);
    }

    #[test]
    fn v6_pads_twenty_zero_bytes() {
        let packet = build_register_packet("SN", 6, Operation::Read { address: 0, reg_len: 1 });
        // header (8) + serial (2) + pad (20) + address (2) + reg_field (2) + crc (2)
        assert_eq!(packet.len(), 8 + 2 + 20 + 2 + 2 + 2);
    }

    #[test]
    fn v5_pads_one_zero_byte() {
        let packet = build_register_packet("SN", 5, Operation::Read { address: 0, reg_len: 1 });
        assert_eq!(packet.len(), 8 + 2 + 1 + 2 + 2 + 2);
    }

    #[test]
    fn decrypted_body_recovers_serial() {
        let packet =
            build_register_packet("LOGGERSN01", 5, Operation::Read { address: 3, reg_len: 45 });
        let frame = RawFrame::parse(packet).unwrap();
        assert_eq!(frame.datalogger_serial().as_deref(), Some("LOGGERSN01"));
    }
}
