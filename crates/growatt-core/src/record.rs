//! The structured output produced from a `LiveData` frame.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::registers::FormattedValue;

/// A single decoded telemetry record, ready for dispatch to sinks.
///
/// Field order in `values` is insertion order is not guaranteed by
/// `BTreeMap`; sinks that need stable ordering (e.g. a snapshot test)
/// should sort by key themselves.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// Inverter serial number.
    pub device: String,
    /// ISO-8601 timestamp, either parsed from the frame or the receiver's
    /// wall clock if parsing failed.
    pub time: String,
    /// Whether this record came from a buffered (offline-queued) frame.
    pub buffered: bool,
    /// Named register values, plus the fixed `logger_serial`/`pv_serial`
    /// entries the source always includes.
    pub values: BTreeMap<String, RecordValue>,
}

/// A single value within a [`Record`]'s `values` map.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    /// A plain string (serial numbers, fault/warning names, bit strings).
    Text(String),
    /// A formatted register reading.
    Register(FormattedValue),
}

impl From<FormattedValue> for RecordValue {
    fn from(value: FormattedValue) -> Self {
        Self::Register(value)
    }
}

impl serde::Serialize for FormattedValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Text(v) | Self::Bits(v) => serializer.serialize_str(v),
            Self::Fault1(f) => serializer.serialize_str(&format!("{f:?}")),
            Self::Fault8(f) => serializer.serialize_str(&format!("{f:?}")),
            Self::Warn8(f) => serializer.serialize_str(&format!("{f:?}")),
        }
    }
}

impl Record {
    /// Starts a new record with the two fixed serial-number fields the
    /// source always includes alongside the named register values.
    #[must_use]
    pub fn new(device: String, time: String, buffered: bool, logger_serial: String, pv_serial: String) -> Self {
        let mut values = BTreeMap::new();
        values.insert("logger_serial".to_string(), RecordValue::Text(logger_serial));
        values.insert("pv_serial".to_string(), RecordValue::Text(pv_serial));
        Self { device, time, buffered, values }
    }

    /// Inserts a formatted register value under `description`.
    pub fn insert(&mut self, description: &str, value: FormattedValue) {
        self.values.insert(description.to_string(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_fixed_fields() {
        let record = Record::new(
            "INV001".to_string(),
            "2024-03-15T10:30:00".to_string(),
            false,
            "LOG001".to_string(),
            "INV001".to_string(),
        );
        let json = serde_json_value(&record);
        assert_eq!(json["values"]["logger_serial"], "LOG001");
    }

    fn serde_json_value(record: &Record) -> serde_json::Value {
        serde_json::to_value(record).expect("record serializes")
    }
}
