//! Property-based tests for register-window discovery and typed reads.

use growatt_core::{Extractor, InverterType, register_map::{RegisterMap, Window}};
use proptest::prelude::*;

fn frame_with_single_window(from_reg: u16, to_reg: u16, register_bytes: &[u16]) -> (Vec<u8>, Window) {
    let mut frame = vec![0u8; 8 + 6]; // header + timestamp placeholder
    let header_start = frame.len();
    frame.extend_from_slice(&[0x02]);
    frame.extend_from_slice(&from_reg.to_be_bytes());
    frame.extend_from_slice(&to_reg.to_be_bytes());
    let data_from = header_start + 5;
    for value in register_bytes {
        frame.extend_from_slice(&value.to_be_bytes());
    }
    (frame, Window { data_from, from_reg, to_reg })
}

fn extractor_over(frame: &[u8], window: Window) -> Extractor<'_> {
    let map = RegisterMap::discover(frame, window);
    Extractor::with_register_map(frame, InverterType::Unknown, map)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: a value written at register `from_reg + k` is always read
    /// back unchanged via `int_at`.
    #[test]
    fn prop_int_at_round_trips(
        from_reg in 0u16..2000,
        span in 1u16..20,
        value in any::<u16>(),
        index in 0u16..20,
    ) {
        let span = span.max(1);
        let index = index % span;
        let to_reg = from_reg + span - 1;
        let mut registers = vec![0u16; usize::from(span)];
        registers[usize::from(index)] = value;
        let (frame, window) = frame_with_single_window(from_reg, to_reg, &registers);
        let extractor = extractor_over(&frame, window);
        prop_assert_eq!(extractor.int_at(from_reg + index).unwrap(), i64::from(value));
    }

    /// Property: repeated extraction and reads on the same bytes always
    /// agree (the extractor is pure w.r.t. its input).
    #[test]
    fn prop_extraction_is_pure(
        from_reg in 0u16..2000,
        span in 1u16..20,
        value in any::<u16>(),
    ) {
        let span = span.max(1);
        let to_reg = from_reg + span - 1;
        let registers = vec![value; usize::from(span)];
        let (frame, window) = frame_with_single_window(from_reg, to_reg, &registers);

        let first = extractor_over(&frame, window.clone());
        let second = extractor_over(&frame, window);
        prop_assert_eq!(first.int_at(from_reg).unwrap(), second.int_at(from_reg).unwrap());
        prop_assert_eq!(first.section_width(), second.section_width());
    }

    /// Property: a register id outside the discovered window is always
    /// InvalidRegister, never a silent wraparound read.
    #[test]
    fn prop_out_of_window_register_is_invalid(
        from_reg in 10u16..2000,
        span in 1u16..20,
        offset in 1u16..50,
    ) {
        let span = span.max(1);
        let to_reg = from_reg + span - 1;
        let registers = vec![0u16; usize::from(span)];
        let (frame, window) = frame_with_single_window(from_reg, to_reg, &registers);
        let extractor = extractor_over(&frame, window);
        let outside = to_reg + offset;
        prop_assert!(extractor.int_at(outside).is_err());
    }
}

#[test]
fn manual_window_offset_matches_formula() {
    let window = Window { data_from: 100, from_reg: 50, to_reg: 60 };
    assert_eq!(window.section_width(), 11);
}
