//! Property-based tests for frame parsing, masking, and the packet
//! builder's round trip through the parser.

use growatt_proto::{
    Operation, PacketType, RawFrame, build_register_packet,
    mask::{xor_mask, xor_masked},
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: masking twice returns the original bytes, for any input.
    #[test]
    fn prop_xor_mask_is_involution(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let masked = xor_masked(&data);
        let mut twice = masked.clone();
        xor_mask(&mut twice);
        prop_assert_eq!(twice, data);
    }

    /// Property: a v5 read packet built for any address/length always
    /// parses back to a well-formed, correctly-typed frame.
    #[test]
    fn prop_v5_read_round_trips(
        address in any::<u16>(),
        reg_len in 1u16..=125,
        serial in "[A-Z0-9]{10}",
    ) {
        let packet = build_register_packet(&serial, 5, Operation::Read { address, reg_len });
        let frame = RawFrame::parse(packet).unwrap();
        prop_assert!(frame.is_well_formed());
        prop_assert_eq!(frame.packet_type(), PacketType::RegisterRead);
        prop_assert_eq!(frame.datalogger_serial().as_deref(), Some(serial.as_str()));
    }

    /// Property: a v6 set packet built for any address/value always parses
    /// back to a well-formed, correctly-typed frame.
    #[test]
    fn prop_v6_set_round_trips(
        address in any::<u16>(),
        value in any::<u16>(),
        serial in "[A-Z0-9]{10}",
    ) {
        let packet = build_register_packet(&serial, 6, Operation::Set { address, value });
        let frame = RawFrame::parse(packet).unwrap();
        prop_assert!(frame.is_well_formed());
        prop_assert_eq!(frame.packet_type(), PacketType::RegisterSet);
    }

    /// Property: flipping any single byte of a well-formed packet's body
    /// never leaves the CRC accidentally valid.
    #[test]
    fn prop_single_byte_corruption_breaks_crc(
        flip_index in 0usize..20,
        address in any::<u16>(),
        reg_len in 1u16..=125,
    ) {
        let mut packet = build_register_packet("CORRUPTME1", 5, Operation::Read { address, reg_len });
        let idx = flip_index % packet.len();
        packet[idx] ^= 0xFF;
        let frame = RawFrame::parse(packet).unwrap();
        prop_assert!(!frame.valid_crc());
    }
}
