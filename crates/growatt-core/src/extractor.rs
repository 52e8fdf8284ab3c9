//! Turns a decrypted data/report frame into typed register reads.

use growatt_proto::PacketType;

use crate::{
    error::CoreError,
    inverter::{self, InverterType},
    register_map::RegisterMap,
};

/// Extracts register windows and typed values from a single decrypted
/// frame (header, body, and CRC trailer together, exactly as observed on
/// the wire before re-masking).
///
/// Construction never fails: an unrecognized signature simply yields
/// [`InverterType::Unknown`] with an empty register map, mirroring the
/// leniency the rest of the proxy expects from frame observation.
pub struct Extractor<'a> {
    frame: &'a [u8],
    inverter: InverterType,
    map: RegisterMap,
}

impl<'a> Extractor<'a> {
    /// Builds an extractor over `frame`, running inverter auto-detection
    /// and register-window discovery immediately.
    #[must_use]
    pub fn new(frame: &'a [u8], packet_type: PacketType) -> Self {
        let (inverter, first_window) = inverter::detect(frame, packet_type);
        let map = match first_window {
            Some((data_from, from_reg, to_reg)) => RegisterMap::discover(
                frame,
                crate::register_map::Window { data_from, from_reg, to_reg },
            ),
            None => RegisterMap::default(),
        };
        Self { frame, inverter, map }
    }

    /// Builds an extractor from an already-known register map, bypassing
    /// inverter auto-detection.
    ///
    /// Useful when the map was discovered elsewhere (or, in tests, to
    /// exercise windowed reads without needing a real inverter
    /// signature).
    #[must_use]
    pub fn with_register_map(frame: &'a [u8], inverter: InverterType, map: RegisterMap) -> Self {
        Self { frame, inverter, map }
    }

    /// The detected inverter family.
    #[must_use]
    pub fn inverter(&self) -> InverterType {
        self.inverter
    }

    /// The discovered register windows.
    #[must_use]
    pub fn register_map(&self) -> &RegisterMap {
        &self.map
    }

    /// Section width of the first window (45 or 125 in practice), used to
    /// select which static register map applies.
    #[must_use]
    pub fn section_width(&self) -> Option<u16> {
        self.map.section_width()
    }

    fn position(&self, register: u16) -> Result<usize, CoreError> {
        self.map.byte_offset(register).ok_or(CoreError::InvalidRegister(register))
    }

    /// Reads 2 bytes at `register`'s offset as a big-endian unsigned
    /// integer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRegister`] if `register` falls outside
    /// every discovered window, or [`CoreError::FrameTooShort`] if the
    /// window claims bytes beyond the frame's actual length.
    pub fn int_at(&self, register: u16) -> Result<i64, CoreError> {
        let start = self.position(register)?;
        let bytes = self
            .frame
            .get(start..start + 2)
            .ok_or(CoreError::FrameTooShort { needed: start + 2, actual: self.frame.len() })?;
        Ok(i64::from(u16::from_be_bytes(bytes.try_into().expect("slice of len 2"))))
    }

    /// Reads 4 bytes at `register`'s offset as a big-endian *signed*
    /// integer.
    ///
    /// # Errors
    ///
    /// Same as [`Extractor::int_at`].
    pub fn long_at(&self, register: u16) -> Result<i64, CoreError> {
        let start = self.position(register)?;
        let bytes = self
            .frame
            .get(start..start + 4)
            .ok_or(CoreError::FrameTooShort { needed: start + 4, actual: self.frame.len() })?;
        Ok(i64::from(i32::from_be_bytes(bytes.try_into().expect("slice of len 4"))))
    }

    /// Reads the ASCII text spanning registers `start_register..=end_register`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRegister`] if `start_register` is
    /// outside every window, [`CoreError::FrameTooShort`] if the span runs
    /// past the frame, or [`CoreError::NotAscii`] if the bytes don't decode.
    pub fn ascii_at(&self, start_register: u16, end_register: u16) -> Result<String, CoreError> {
        let start = self.position(start_register)?;
        let end_reg_offset = self.position(end_register).unwrap_or(start);
        let end = end_reg_offset + 2;
        let bytes = self
            .frame
            .get(start..end)
            .ok_or(CoreError::FrameTooShort { needed: end, actual: self.frame.len() })?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CoreError::NotAscii { register: start_register })
    }

    /// Parses the packet timestamp from the 6 bytes (`YY MM DD HH MM SS`)
    /// immediately preceding the first register window header.
    ///
    /// Returns `None` if no window was discovered, or if the 6 bytes don't
    /// parse as a plausible date/time; callers should fall back to the
    /// receiver's wall-clock in that case, as the source does.
    #[must_use]
    pub fn timestamp(&self) -> Option<(u16, u8, u8, u8, u8, u8)> {
        let first = self.map.windows().first()?;
        // first.data_from is 5 bytes after the window header's position;
        // the 6-byte timestamp sits immediately before that position.
        let header_start = first.data_from.checked_sub(5)?;
        let ts_start = header_start.checked_sub(6)?;
        let bytes = self.frame.get(ts_start..header_start)?;
        let [yy, mm, dd, hh, mi, ss] = bytes.try_into().ok()?;
        if !(1..=12).contains(&mm) || !(1..=31).contains(&dd) || hh > 23 || mi > 59 || ss > 59 {
            return None;
        }
        Some((2000 + u16::from(yy), mm, dd, hh, mi, ss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn min_signature_frame() -> Vec<u8> {
        let mut frame = vec![0u8; 8];
        // 6-byte timestamp: 2024-03-15 10:30:00
        frame.extend_from_slice(&[24, 3, 15, 10, 30, 0]);
        frame.extend_from_slice(&[0x02, 0x0b, 0xb8, 0x0c, 0x34]);
        frame.extend_from_slice(&vec![0u8; 2 * 125]);
        frame
    }

    #[test]
    fn detects_inverter_and_builds_map() {
        let frame = min_signature_frame();
        let extractor = Extractor::new(&frame, PacketType::LiveData);
        assert_eq!(extractor.inverter(), InverterType::Min);
        assert_eq!(extractor.section_width(), Some(125));
    }

    #[test]
    fn int_at_reads_register_value() {
        let mut frame = min_signature_frame();
        let first_data_offset = frame.len() - 2 * 125;
        frame[first_data_offset..first_data_offset + 2].copy_from_slice(&2024u16.to_be_bytes());
        let extractor = Extractor::new(&frame, PacketType::LiveData);
        assert_eq!(extractor.int_at(0x0bb8).unwrap(), 2024);
    }

    #[test]
    fn unknown_register_is_invalid() {
        let frame = min_signature_frame();
        let extractor = Extractor::new(&frame, PacketType::LiveData);
        assert!(matches!(extractor.int_at(9), Err(CoreError::InvalidRegister(9))));
    }

    #[test]
    fn timestamp_parses_preceding_bytes() {
        let frame = min_signature_frame();
        let extractor = Extractor::new(&frame, PacketType::LiveData);
        assert_eq!(extractor.timestamp(), Some((2024, 3, 15, 10, 30, 0)));
    }

    #[test]
    fn no_signature_yields_empty_map() {
        let frame = vec![0u8; 40];
        let extractor = Extractor::new(&frame, PacketType::LiveData);
        assert_eq!(extractor.inverter(), InverterType::Unknown);
        assert!(extractor.timestamp().is_none());
    }
}
