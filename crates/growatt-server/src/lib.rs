//! Growatt telemetry proxy server.
//!
//! Wires the pure frame/domain logic of `growatt-proto` and `growatt-core`
//! into a running TCP proxy: per-connection sessions, the session registry,
//! sink dispatch, the local control channel, and the accept loop.
//!
//! # Components
//!
//! - [`session::Session`]: one datalogger↔cloud proxy pipe.
//! - [`registry::SessionRegistry`]: the two lookup indices over live
//!   sessions.
//! - [`dispatch::Dispatch`]: fan-out of decoded records to sinks.
//! - [`mqtt::MqttPublisher`]: the MQTT sink implementation.
//! - [`server::Server`]: accept loop, signal handling, session lifecycle.
//! - [`control`]: the local command channel used to inspect/poll sessions.
//! - [`system_env::SystemEnv`]: production [`growatt_core::env::Environment`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod control;
pub mod dispatch;
pub mod error;
pub mod mqtt;
pub mod registry;
pub mod server;
pub mod session;
pub mod system_env;

pub use error::{Result, ServerError};
pub use server::Server;
pub use system_env::SystemEnv;
