//! Growatt proxy domain logic.
//!
//! Pure, no-async core: register-window discovery, inverter family
//! detection, the static register maps and their formatters, and the
//! domain types (`Record`, `ProxyConfig`, plugin traits) shared between the
//! session/dispatch layers in `growatt_server`.
//!
//! # Components
//!
//! - [`extractor::Extractor`]: turns a decrypted frame into typed register
//!   reads, given the already-detected inverter family and register map.
//! - [`inverter`]: inverter-family auto-detection from a frame's
//!   register-window signature.
//! - [`register_map`]: windowed register discovery and offset arithmetic.
//! - [`registers`]: static per-register metadata and value formatting.
//! - [`faults`]: named fault/warning code decoding.
//! - [`record::Record`]: the structured record dispatched to sinks.
//! - [`config::ProxyConfig`]: the shape of accepted runtime configuration.
//! - [`plugin`]: the sync/async plugin trait surface.
//! - [`env::Environment`]: time abstraction for deterministic tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod extractor;
pub mod faults;
pub mod inverter;
pub mod plugin;
pub mod record;
pub mod register_map;
pub mod registers;

pub use config::ProxyConfig;
pub use error::{CoreError, Result};
pub use extractor::Extractor;
pub use inverter::InverterType;
pub use plugin::{AsyncPlugin, SyncPlugin};
pub use record::{Record, RecordValue};
pub use register_map::{RegisterMap, Window};
