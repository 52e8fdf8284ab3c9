//! Inverter family auto-detection from a frame's register-window signature.

use growatt_proto::PacketType;

/// Inverter family, determined by matching a short byte signature in the
/// frame header region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InverterType {
    /// Micro inverter.
    Mac,
    /// Max-series hybrid inverter.
    Max,
    /// Mid-series hybrid inverter.
    Mid,
    /// Min-series inverter.
    Min,
    /// Mix-series hybrid/storage inverter.
    Mix,
    /// SPA-series storage inverter.
    Spa,
    /// SPF-series off-grid inverter.
    Spf,
    /// SPH-series hybrid inverter.
    Sph,
    /// Signature not recognized.
    Unknown,
}

/// Number of leading bytes of the decrypted frame searched for a signature.
///
/// Carried over from the source's `HEADER_MAX_LEN = 158`, which counted hex
/// nibbles over the same bytes; 158 nibbles is 79 bytes.
const SIGNATURE_SEARCH_LEN: usize = 79;

/// A decoded register-window header: a one-byte section indicator followed
/// by `from_reg`/`to_reg` as big-endian `u16`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowHeader {
    /// Byte offset of the first register's data, immediately after this
    /// header.
    data_from: usize,
    from_reg: u16,
    to_reg: u16,
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let limit = haystack.len().min(SIGNATURE_SEARCH_LEN);
    haystack[..limit].windows(needle.len()).position(|w| w == needle)
}

fn decode_window_at(frame: &[u8], position: usize) -> WindowHeader {
    let from_reg = u16::from_be_bytes([frame[position + 1], frame[position + 2]]);
    let to_reg = u16::from_be_bytes([frame[position + 3], frame[position + 4]]);
    WindowHeader { data_from: position + 5, from_reg, to_reg }
}

fn next_map_bytes(frame: &[u8], window: &WindowHeader) -> Option<&[u8]> {
    let section_width = usize::from(window.to_reg - window.from_reg + 1);
    let next = window.data_from + section_width * 2;
    frame.get(next..next + 4)
}

/// Detects the inverter family and, if found, the first register window.
///
/// `frame` is the complete decrypted frame (header, body, and CRC trailer)
/// — signatures are matched against absolute frame offsets, matching how
/// the detection table in the protocol documentation is phrased.
pub(crate) fn detect(frame: &[u8], packet_type: PacketType) -> (InverterType, Option<(usize, u16, u16)>) {
    let is_data_or_buffered = matches!(packet_type, PacketType::LiveData | PacketType::BufferedData);
    let is_report = packet_type == PacketType::InverterReport;

    if is_data_or_buffered {
        if let Some(pos) = find(frame, &[0x02, 0x0b, 0xb8, 0x0c, 0x34]) {
            return (InverterType::Min, Some(window_tuple(decode_window_at(frame, pos))));
        }
        if let Some(pos) = find(frame, &[0x02, 0x03, 0xe8, 0x04, 0x64]) {
            return (InverterType::Spa, Some(window_tuple(decode_window_at(frame, pos))));
        }
        if let Some(pos) =
            find(frame, &[0x03, 0x00, 0x00, 0x00, 0x2c]).or_else(|| find(frame, &[0x02, 0x00, 0x00, 0x00, 0x2c]))
        {
            return (InverterType::Spf, Some(window_tuple(decode_window_at(frame, pos))));
        }
        if let Some(pos) = find(frame, &[0x02, 0x00, 0x00, 0x00, 0x7c]) {
            let window = decode_window_at(frame, pos);
            if let Some(next) = next_map_bytes(frame, &window) {
                if next == [0x00, 0x7d, 0x00, 0xf9] {
                    let result = if frame[3] == 5 {
                        InverterType::Mid
                    } else if frame[3] == 6 {
                        InverterType::Max
                    } else {
                        InverterType::Unknown
                    };
                    return (result, Some(window_tuple(window)));
                }
                if next == [0x03, 0xe8, 0x04, 0x64] {
                    return (InverterType::Sph, Some(window_tuple(window)));
                }
            }
        }
        if let Some(pos) = find(frame, &[0x03, 0x00, 0x00, 0x00, 0x7c]) {
            return (InverterType::Sph, Some(window_tuple(decode_window_at(frame, pos))));
        }
    }

    if is_report {
        if let Some(pos) =
            find(frame, &[0x02, 0x00, 0x00, 0x00, 0x2c]).or_else(|| find(frame, &[0x03, 0x00, 0x00, 0x00, 0x2c]))
        {
            return (InverterType::Spf, Some(window_tuple(decode_window_at(frame, pos))));
        }
        if let Some(pos) = find(frame, &[0x02, 0x00, 0x00, 0x00, 0x7c]) {
            let window = decode_window_at(frame, pos);
            if let Some(next) = next_map_bytes(frame, &window) {
                if next == [0x0b, 0xb8, 0x0c, 0x34] {
                    return (InverterType::Min, Some(window_tuple(window)));
                }
                if next == [0x00, 0x7d, 0x00, 0xf9] {
                    let result = if frame[3] == 5 {
                        InverterType::Mid
                    } else if frame[3] == 6 {
                        InverterType::Max
                    } else {
                        InverterType::Unknown
                    };
                    return (result, Some(window_tuple(window)));
                }
                if next == [0x03, 0xe8, 0x04, 0x64] {
                    return (InverterType::Sph, Some(window_tuple(window)));
                }
            }
        }
        if let Some(pos) = find(frame, &[0x03, 0x00, 0x00, 0x00, 0x7c]) {
            return (InverterType::Sph, Some(window_tuple(decode_window_at(frame, pos))));
        }
    }

    (InverterType::Unknown, None)
}

fn window_tuple(window: WindowHeader) -> (usize, u16, u16) {
    (window.data_from, window.from_reg, window.to_reg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(prefix: &[u8], signature_at: usize, signature: &[u8]) -> Vec<u8> {
        let mut buf = prefix.to_vec();
        buf.resize(signature_at, 0);
        buf.extend_from_slice(signature);
        buf
    }

    #[test]
    fn detects_min_from_data_signature() {
        let frame = padded(&[0, 1, 0, 6, 0, 0, 1, 4], 20, &[0x02, 0x0b, 0xb8, 0x0c, 0x34]);
        let (kind, window) = detect(&frame, PacketType::LiveData);
        assert_eq!(kind, InverterType::Min);
        let (data_from, from_reg, to_reg) = window.unwrap();
        assert_eq!(data_from, 25);
        assert_eq!(from_reg, 0x0bb8);
        assert_eq!(to_reg, 0x0c34);
    }

    #[test]
    fn unrecognized_signature_is_unknown() {
        let frame = vec![0u8; 40];
        let (kind, window) = detect(&frame, PacketType::LiveData);
        assert_eq!(kind, InverterType::Unknown);
        assert!(window.is_none());
    }

    #[test]
    fn report_spf_signature_detected() {
        let frame = padded(&[0, 1, 0, 6, 0, 0, 1, 3], 12, &[0x02, 0x00, 0x00, 0x00, 0x2c]);
        let (kind, _) = detect(&frame, PacketType::InverterReport);
        assert_eq!(kind, InverterType::Spf);
    }
}
