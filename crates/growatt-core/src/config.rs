//! Immutable runtime configuration accepted by the core.
//!
//! Parsing the on-disk TOML file is an ambient concern of the server
//! binary (see `growatt_server`'s config loader); this module only defines
//! the shape the core accepts, mirroring the source's recognized options
//! one-for-one.

use std::collections::HashMap;

use serde::Deserialize;

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    5279
}

fn default_upstream_address() -> String {
    "server.growatt.com".to_string()
}

fn default_upstream_port() -> u16 {
    5279
}

fn default_log_output() -> LogOutput {
    LogOutput::Stdout
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "growatt_proxy.log".to_string()
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Write to standard output.
    Stdout,
    /// Write to a rotating file.
    File,
}

/// `[mqtt]` section: the optional MQTT publisher sink.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Whether the MQTT sink is active.
    pub enabled: bool,
    /// Broker address.
    pub server: String,
    /// Broker port.
    pub port: u16,
    /// Whether to authenticate with `user`/`pass`.
    pub auth: bool,
    /// Broker username, used only if `auth` is set.
    pub user: String,
    /// Broker password, used only if `auth` is set.
    pub pass: String,
    /// Topic records are published to.
    pub topic: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server: "127.0.0.1".to_string(),
            port: 1883,
            auth: false,
            user: String::new(),
            pass: String::new(),
            topic: "grott/energy".to_string(),
        }
    }
}

/// The proxy's full, immutable runtime configuration.
///
/// # Invariants
///
/// - `dtc_mapping` entries are a per-DTC *allow-list*; a DTC absent from
///   the map means "emit every register in the active static map",
///   matching the source's `dict.get(dtc, mapping.keys())` fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Address the proxy listens on for datalogger connections.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// Port the proxy listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Upstream (vendor cloud) address the proxy forwards to.
    #[serde(default = "default_upstream_address")]
    pub upstream_address: String,
    /// Upstream port.
    #[serde(default = "default_upstream_port")]
    pub upstream_port: u16,

    /// Where to send log output.
    #[serde(default = "default_log_output")]
    pub log_output: LogOutput,
    /// Minimum log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// File path used when `log_output == File`.
    #[serde(default = "default_log_file")]
    pub log_file: String,
    /// Whether each datalogger gets its own log file/span.
    #[serde(default)]
    pub separate_logs_per_datalogger: bool,

    /// Optional MQTT publisher configuration.
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Per-DTC register allow-lists for emitted `LiveData` records.
    #[serde(default)]
    pub dtc_mapping: HashMap<u16, Vec<u16>>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            listen_port: default_listen_port(),
            upstream_address: default_upstream_address(),
            upstream_port: default_upstream_port(),
            log_output: default_log_output(),
            log_level: default_log_level(),
            log_file: default_log_file(),
            separate_logs_per_datalogger: false,
            mqtt: MqttConfig::default(),
            dtc_mapping: HashMap::new(),
        }
    }
}

impl ProxyConfig {
    /// Returns the allow-listed register ids for `dtc`, or `None` if `dtc`
    /// has no entry (meaning: emit every register in the active map).
    #[must_use]
    pub fn allowed_registers(&self, dtc: u16) -> Option<&[u16]> {
        self.dtc_mapping.get(&dtc).map(Vec::as_slice)
    }
}
