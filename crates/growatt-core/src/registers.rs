//! Static register metadata: which registers carry what kind of value, and
//! how to format them.

use std::sync::LazyLock;

use growatt_proto::PacketType;

use crate::faults::{Fault1, Fault8, Warn8};

/// How a register's raw integer value should be interpreted and formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegType {
    /// Plain integer, no scaling.
    Integer,
    /// Scaled decimal; the raw value divided by `divisor`, rounded to 3
    /// decimal places.
    ScaledFloat {
        /// Divisor applied to the raw register value.
        divisor: u32,
    },
    /// ASCII text spanning multiple registers.
    Text,
    /// Zero-padded 16-bit binary string.
    Bit16,
    /// Single-byte fault code, see [`Fault1`].
    FaultCode1,
    /// Four-byte fault bitmask, see [`Fault8`].
    FaultCode8,
    /// Two-byte warning bitmask, see [`Warn8`].
    WarnCode8,
}

/// Static metadata describing a known register.
#[derive(Debug, Clone, Copy)]
pub struct RegisterSpec {
    /// Register id.
    pub id: u16,
    /// Number of consecutive registers (1 or 2) this value spans.
    pub length: u16,
    /// How to interpret the raw value.
    pub reg_type: RegType,
    /// Field name used in emitted records.
    pub description: &'static str,
}

/// A formatted register value, ready for inclusion in a [`crate::record::Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum FormattedValue {
    /// An unscaled integer.
    Integer(i64),
    /// A scaled decimal, rounded to 3 places.
    Float(f64),
    /// Decoded ASCII text.
    Text(String),
    /// A zero-padded 16-bit binary string.
    Bits(String),
    /// A named single-byte fault code.
    Fault1(Fault1),
    /// A named four-byte fault bitmask.
    Fault8(Fault8),
    /// A named two-byte warning bitmask.
    Warn8(Warn8),
}

impl RegisterSpec {
    /// Formats a raw integer register value per this spec's [`RegType`].
    ///
    /// Text values are not handled here — they are read directly via
    /// `ascii_at` and wrapped by the caller, since they require the decoded
    /// string rather than a raw integer.
    #[must_use]
    pub fn format_int(&self, raw: i64) -> FormattedValue {
        match self.reg_type {
            RegType::Integer => FormattedValue::Integer(raw),
            RegType::ScaledFloat { divisor } => {
                let scaled = raw as f64 / f64::from(divisor);
                FormattedValue::Float((scaled * 1000.0).round() / 1000.0)
            },
            RegType::Bit16 => FormattedValue::Bits(format!("{:016b}", raw as u16)),
            RegType::FaultCode1 => FormattedValue::Fault1(Fault1::from_code(raw as u16)),
            RegType::FaultCode8 => FormattedValue::Fault8(Fault8::from_code(raw as u32)),
            RegType::WarnCode8 => FormattedValue::Warn8(Warn8::from_code(raw as u16)),
            RegType::Text => FormattedValue::Integer(raw),
        }
    }
}

/// Holding-register map for report packets (`InverterReport`) on inverters
/// with 125 registers per section.
pub static MAP_03_125: LazyLock<Vec<RegisterSpec>> = LazyLock::new(|| {
    vec![
        RegisterSpec { id: 34, length: 7, reg_type: RegType::Text, description: "m_info" },
        RegisterSpec { id: 43, length: 1, reg_type: RegType::Integer, description: "DTC" },
        RegisterSpec { id: 125, length: 7, reg_type: RegType::Text, description: "device_type" },
    ]
});

/// Input-register map for live/buffered data packets (`LiveData`,
/// `BufferedData`) on inverters with 125 registers per section.
#[rustfmt::skip]
pub static MAP_04_125: LazyLock<Vec<RegisterSpec>> = LazyLock::new(|| {
    vec![
        RegisterSpec { id: 0, length: 1, reg_type: RegType::Integer, description: "pvstatus" },
        RegisterSpec { id: 1, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "in_power" },

        RegisterSpec { id: 3, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv1_voltage" },
        RegisterSpec { id: 4, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv1_current" },
        RegisterSpec { id: 5, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv1_power" },
        RegisterSpec { id: 7, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv2_voltage" },
        RegisterSpec { id: 8, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv2_current" },
        RegisterSpec { id: 9, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv2_power" },
        RegisterSpec { id: 11, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv3_voltage" },
        RegisterSpec { id: 12, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv3_current" },
        RegisterSpec { id: 13, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv3_power" },
        RegisterSpec { id: 15, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv4_voltage" },
        RegisterSpec { id: 16, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv4_current" },
        RegisterSpec { id: 17, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv4_power" },
        RegisterSpec { id: 19, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv5_voltage" },
        RegisterSpec { id: 20, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv5_current" },
        RegisterSpec { id: 21, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv5_power" },
        RegisterSpec { id: 23, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv6_voltage" },
        RegisterSpec { id: 24, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv6_current" },
        RegisterSpec { id: 25, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv6_power" },
        RegisterSpec { id: 27, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv7_voltage" },
        RegisterSpec { id: 28, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv7_current" },
        RegisterSpec { id: 29, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv7_power" },
        RegisterSpec { id: 31, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv8_voltage" },
        RegisterSpec { id: 32, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv8_current" },
        RegisterSpec { id: 33, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv8_power" },

        RegisterSpec { id: 35, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "out_power" },
        RegisterSpec { id: 37, length: 1, reg_type: RegType::ScaledFloat { divisor: 100 }, description: "grid_freq" },
        RegisterSpec { id: 38, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "grid_voltage_phase_1" },
        RegisterSpec { id: 39, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "grid_out_current_phase_1" },
        RegisterSpec { id: 40, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "grid_out_watt_va_phase_1" },
        RegisterSpec { id: 42, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "grid_voltage_phase_2" },
        RegisterSpec { id: 43, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "grid_out_current_phase_2" },
        RegisterSpec { id: 44, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "grid_out_watt_va_phase_2" },
        RegisterSpec { id: 46, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "grid_voltage_phase_3" },
        RegisterSpec { id: 47, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "grid_out_current_phase_3" },
        RegisterSpec { id: 48, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "grid_out_watt_va_phase_3" },

        RegisterSpec { id: 50, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "vac_rs" },
        RegisterSpec { id: 51, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "vac_st" },
        RegisterSpec { id: 52, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "vac_tr" },
        RegisterSpec { id: 53, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "energy_today" },
        RegisterSpec { id: 55, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "energy_total" },
        RegisterSpec { id: 57, length: 2, reg_type: RegType::ScaledFloat { divisor: 7200 }, description: "working_time" },

        RegisterSpec { id: 59, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv1_energy_today" },
        RegisterSpec { id: 61, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv1_energy_total" },
        RegisterSpec { id: 63, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv2_energy_today" },
        RegisterSpec { id: 65, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv2_energy_total" },
        RegisterSpec { id: 67, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv3_energy_today" },
        RegisterSpec { id: 69, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv3_energy_total" },
        RegisterSpec { id: 71, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv4_energy_today" },
        RegisterSpec { id: 73, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv4_energy_total" },
        RegisterSpec { id: 75, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv5_energy_today" },
        RegisterSpec { id: 77, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv5_energy_total" },
        RegisterSpec { id: 79, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv6_energy_today" },
        RegisterSpec { id: 81, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv6_energy_total" },
        RegisterSpec { id: 83, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv7_energy_today" },
        RegisterSpec { id: 85, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv7_energy_total" },
        RegisterSpec { id: 87, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv8_energy_today" },
        RegisterSpec { id: 89, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv8_energy_total" },
        RegisterSpec { id: 91, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv_energy_total" },

        RegisterSpec { id: 93, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "inverter_temp" },
        RegisterSpec { id: 94, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "inverter_inside_temp" },
        RegisterSpec { id: 95, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "boost_temp" },
        RegisterSpec { id: 97, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "batt_v" },
        RegisterSpec { id: 98, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pbus_volt" },
        RegisterSpec { id: 99, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "nbus_volt" },
        RegisterSpec { id: 100, length: 1, reg_type: RegType::ScaledFloat { divisor: 20000 }, description: "power_factor_now" },
        RegisterSpec { id: 101, length: 1, reg_type: RegType::ScaledFloat { divisor: 100 }, description: "real_out_power_pct" },
        RegisterSpec { id: 102, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "out_max_power" },
        RegisterSpec { id: 104, length: 1, reg_type: RegType::ScaledFloat { divisor: 1 }, description: "derating_mode" },
        RegisterSpec { id: 105, length: 1, reg_type: RegType::FaultCode1, description: "inverter_fault_code" },
        RegisterSpec { id: 106, length: 2, reg_type: RegType::FaultCode8, description: "inverter_fault_bit" },
        RegisterSpec { id: 110, length: 2, reg_type: RegType::Integer, description: "inverter_warning_bit" },

        RegisterSpec { id: 125, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv1_pid_voltage" },
        RegisterSpec { id: 126, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv1_pid_current" },
        RegisterSpec { id: 127, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv2_pid_voltage" },
        RegisterSpec { id: 128, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv2_pid_current" },
        RegisterSpec { id: 129, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv3_pid_voltage" },
        RegisterSpec { id: 130, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv3_pid_current" },
        RegisterSpec { id: 131, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv4_pid_voltage" },
        RegisterSpec { id: 132, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv4_pid_current" },
        RegisterSpec { id: 133, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv5_pid_voltage" },
        RegisterSpec { id: 134, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv5_pid_current" },
        RegisterSpec { id: 135, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv6_pid_voltage" },
        RegisterSpec { id: 136, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv6_pid_current" },
        RegisterSpec { id: 137, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv7_pid_voltage" },
        RegisterSpec { id: 138, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv7_pid_current" },
        RegisterSpec { id: 139, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv8_pid_voltage" },
        RegisterSpec { id: 140, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pv8_pid_current" },
        RegisterSpec { id: 141, length: 1, reg_type: RegType::Bit16, description: "pv_pid_status" },

        RegisterSpec { id: 142, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string1_voltage" },
        RegisterSpec { id: 143, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string1_current" },
        RegisterSpec { id: 144, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string2_voltage" },
        RegisterSpec { id: 145, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string2_current" },
        RegisterSpec { id: 146, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string3_voltage" },
        RegisterSpec { id: 147, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string3_current" },
        RegisterSpec { id: 148, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string4_voltage" },
        RegisterSpec { id: 149, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string4_current" },
        RegisterSpec { id: 150, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string5_voltage" },
        RegisterSpec { id: 151, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string5_current" },
        RegisterSpec { id: 152, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string6_voltage" },
        RegisterSpec { id: 153, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string6_current" },
        RegisterSpec { id: 154, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string7_voltage" },
        RegisterSpec { id: 155, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string7_current" },
        RegisterSpec { id: 156, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string8_voltage" },
        RegisterSpec { id: 157, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string8_current" },
        RegisterSpec { id: 158, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string9_voltage" },
        RegisterSpec { id: 159, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string9_current" },
        RegisterSpec { id: 160, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string10_voltage" },
        RegisterSpec { id: 161, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string10_current" },
        RegisterSpec { id: 162, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string11_voltage" },
        RegisterSpec { id: 163, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string11_current" },
        RegisterSpec { id: 164, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string12_voltage" },
        RegisterSpec { id: 165, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string12_current" },
        RegisterSpec { id: 166, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string13_voltage" },
        RegisterSpec { id: 167, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string13_current" },
        RegisterSpec { id: 168, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string14_voltage" },
        RegisterSpec { id: 169, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string14_current" },
        RegisterSpec { id: 170, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string15_voltage" },
        RegisterSpec { id: 171, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string15_current" },
        RegisterSpec { id: 172, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string16_voltage" },
        RegisterSpec { id: 173, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "string16_current" },

        RegisterSpec { id: 174, length: 1, reg_type: RegType::Bit16, description: "string_unmatch" },
        RegisterSpec { id: 175, length: 1, reg_type: RegType::Bit16, description: "string_cur_unbalance" },
        RegisterSpec { id: 176, length: 1, reg_type: RegType::Bit16, description: "string_disconnect" },
        RegisterSpec { id: 177, length: 1, reg_type: RegType::Bit16, description: "pid_fault_code" },
        RegisterSpec { id: 178, length: 1, reg_type: RegType::Bit16, description: "string_prompt" },
        RegisterSpec { id: 179, length: 1, reg_type: RegType::Integer, description: "pv_warn_val" },

        RegisterSpec { id: 180, length: 1, reg_type: RegType::Integer, description: "dsp_075_warning" },
        RegisterSpec { id: 181, length: 1, reg_type: RegType::Integer, description: "dsp_075_fault" },

        RegisterSpec { id: 200, length: 1, reg_type: RegType::Integer, description: "pv_iso_kohm" },
        RegisterSpec { id: 201, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "r_dci_current" },
        RegisterSpec { id: 202, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "s_dci_current" },
        RegisterSpec { id: 203, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "t_dci_current" },
        RegisterSpec { id: 204, length: 1, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "pid_bus_voltage" },

        RegisterSpec { id: 206, length: 1, reg_type: RegType::Bit16, description: "svg_apf_status_ratio" },

        RegisterSpec { id: 229, length: 1, reg_type: RegType::Bit16, description: "fan_fault" },

        RegisterSpec { id: 230, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "out_apparent_power" },
        RegisterSpec { id: 232, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "out_reactive_power" },
        RegisterSpec { id: 234, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "max_reactive_power" },
        RegisterSpec { id: 236, length: 2, reg_type: RegType::ScaledFloat { divisor: 10 }, description: "tot_reactive_power" },
    ]
});

/// Holding-register map for report packets on inverters with 45 registers
/// per section.
///
/// Left empty: the 45-register variant was never populated upstream.
/// Extraction against an empty map simply yields a record with no values —
/// see [`crate::register_map`] for the windowing that still runs
/// regardless of which static map backs it.
pub static MAP_03_45: LazyLock<Vec<RegisterSpec>> = LazyLock::new(Vec::new);

/// Input-register map for data packets on inverters with 45 registers per
/// section. Left empty for the same reason as [`MAP_03_45`].
pub static MAP_04_45: LazyLock<Vec<RegisterSpec>> = LazyLock::new(Vec::new);

/// Selects the static register map that applies to a frame, keyed by its
/// packet type (report vs. live/buffered data) and discovered section
/// width.
///
/// `InverterReport` selects the *03* map; `LiveData`/`BufferedData` select
/// the *04* map. A width of 125 selects the 125-register variant, anything
/// else (including no discovered window) falls back to the 45-register
/// variant, which is currently empty.
#[must_use]
pub fn map_for(packet_type: PacketType, section_width: Option<u16>) -> &'static [RegisterSpec] {
    let is_125 = section_width == Some(125);
    match (packet_type, is_125) {
        (PacketType::InverterReport, true) => &MAP_03_125,
        (PacketType::InverterReport, false) => &MAP_03_45,
        (_, true) => &MAP_04_125,
        (_, false) => &MAP_04_45,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_float_rounds_to_three_decimals() {
        let spec = RegisterSpec { id: 37, length: 1, reg_type: RegType::ScaledFloat { divisor: 100 }, description: "grid_freq" };
        match spec.format_int(5003) {
            FormattedValue::Float(v) => assert!((v - 50.03).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bit16_zero_pads() {
        let spec = RegisterSpec { id: 174, length: 1, reg_type: RegType::Bit16, description: "string_unmatch" };
        match spec.format_int(5) {
            FormattedValue::Bits(s) => assert_eq!(s, "0000000000000101"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn map_03_125_has_dtc_register() {
        assert!(MAP_03_125.iter().any(|r| r.id == 43 && r.description == "DTC"));
    }

    /// Ported register count must match the upstream `map_04_125` table,
    /// so a future edit can't silently drop entries again.
    #[test]
    fn map_04_125_has_full_register_count() {
        assert_eq!(MAP_04_125.len(), 141);
    }

    #[test]
    fn map_04_125_has_string_and_pid_registers() {
        assert!(MAP_04_125.iter().any(|r| r.id == 19 && r.description == "pv5_voltage"));
        assert!(MAP_04_125.iter().any(|r| r.id == 141 && r.description == "pv_pid_status"));
        assert!(MAP_04_125.iter().any(|r| r.id == 173 && r.description == "string16_current"));
        assert!(MAP_04_125.iter().any(|r| r.id == 206 && r.description == "svg_apf_status_ratio"));
        assert!(MAP_04_125.iter().any(|r| r.id == 229 && r.description == "fan_fault"));
    }

    #[test]
    fn forty_five_register_maps_are_intentionally_empty() {
        assert!(MAP_03_45.is_empty());
        assert!(MAP_04_45.is_empty());
    }

    #[test]
    fn map_for_selects_by_type_and_width() {
        assert!(std::ptr::eq(
            map_for(PacketType::InverterReport, Some(125)),
            MAP_03_125.as_slice()
        ));
        assert!(std::ptr::eq(map_for(PacketType::LiveData, Some(125)), MAP_04_125.as_slice()));
        assert!(std::ptr::eq(map_for(PacketType::LiveData, Some(45)), MAP_04_45.as_slice()));
        assert!(std::ptr::eq(map_for(PacketType::LiveData, None), MAP_04_45.as_slice()));
    }
}
