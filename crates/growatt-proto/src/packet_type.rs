//! The closed set of Growatt message types, keyed by header bytes 6..8.

/// Message type carried in a frame header.
///
/// Wire values are fixed by the protocol; unrecognized values decode to
/// [`PacketType::Unknown`] rather than failing, matching the leniency the
/// proxy needs to forward bytes it doesn't understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Periodic report carrying device metadata, including the DTC register.
    InverterReport,
    /// Live telemetry snapshot.
    LiveData,
    /// Holding-register read request or its response.
    RegisterRead,
    /// Holding-register write request or its response.
    RegisterSet,
    /// Datalogger clock synchronization.
    SetTime,
    /// Heartbeat with no payload of interest.
    KeepAlive,
    /// Datalogger configuration exchange.
    DataloggerConfig,
    /// Datalogger self-report (firmware, signal strength, etc).
    DataloggerReport,
    /// Telemetry buffered while the datalogger was offline.
    BufferedData,
    /// Any wire value not in the recognized set.
    Unknown,
}

impl PacketType {
    /// Decodes a wire value into a packet type. Never fails.
    #[must_use]
    pub fn from_wire(value: u16) -> Self {
        match value {
            0x0103 => Self::InverterReport,
            0x0104 => Self::LiveData,
            0x0105 => Self::RegisterRead,
            0x0106 => Self::RegisterSet,
            0x0110 => Self::SetTime,
            0x0116 => Self::KeepAlive,
            0x0118 => Self::DataloggerConfig,
            0x0119 => Self::DataloggerReport,
            0x0150 => Self::BufferedData,
            _ => Self::Unknown,
        }
    }

    /// Encodes this packet type back to its wire value.
    ///
    /// [`PacketType::Unknown`] encodes to `0x0000`, matching the source
    /// protocol's fallback value; round-tripping an unrecognized value
    /// through `from_wire`/`to_wire` does not preserve the original value,
    /// only the fact that it was unrecognized.
    #[must_use]
    pub fn to_wire(self) -> u16 {
        match self {
            Self::InverterReport => 0x0103,
            Self::LiveData => 0x0104,
            Self::RegisterRead => 0x0105,
            Self::RegisterSet => 0x0106,
            Self::SetTime => 0x0110,
            Self::KeepAlive => 0x0116,
            Self::DataloggerConfig => 0x0118,
            Self::DataloggerReport => 0x0119,
            Self::BufferedData => 0x0150,
            Self::Unknown => 0x0000,
        }
    }

    /// True for the three frame classes the extractor ever runs against.
    #[must_use]
    pub fn carries_registers(self) -> bool {
        matches!(self, Self::InverterReport | Self::LiveData | Self::BufferedData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_values() {
        let known = [
            (0x0103, PacketType::InverterReport),
            (0x0104, PacketType::LiveData),
            (0x0105, PacketType::RegisterRead),
            (0x0106, PacketType::RegisterSet),
            (0x0110, PacketType::SetTime),
            (0x0116, PacketType::KeepAlive),
            (0x0118, PacketType::DataloggerConfig),
            (0x0119, PacketType::DataloggerReport),
            (0x0150, PacketType::BufferedData),
        ];
        for (wire, expected) in known {
            assert_eq!(PacketType::from_wire(wire), expected);
            assert_eq!(expected.to_wire(), wire);
        }
    }

    #[test]
    fn unknown_value_falls_back() {
        assert_eq!(PacketType::from_wire(0xBEEF), PacketType::Unknown);
        assert_eq!(PacketType::Unknown.to_wire(), 0x0000);
    }
}
