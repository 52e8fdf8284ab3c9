//! Server-level error types.

use thiserror::Error;

/// Errors surfaced by the session, server, control-channel, and dispatch
/// layers.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Cannot open the upstream connection at session start. The session is
    /// discarded; there is no retry.
    #[error("cannot reach upstream {address}: {source}")]
    UpstreamUnreachable {
        /// Upstream address that was dialed.
        address: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Either half of the proxied connection closed or reset.
    #[error("peer {peer} closed: {reason}")]
    PeerClosed {
        /// Address of the side that closed.
        peer: String,
        /// Human-readable reason (EOF, reset, I/O error).
        reason: String,
    },

    /// A malformed control-channel command.
    #[error("malformed control command: {0}")]
    ControlProtocolError(String),

    /// Transport/bind error at server startup.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Error from the protocol codec layer.
    #[error(transparent)]
    Protocol(#[from] growatt_proto::ProtocolError),

    /// Error from the domain/extraction layer.
    #[error(transparent)]
    Core(#[from] growatt_core::CoreError),
}

/// Convenience alias for results in this crate.
pub type Result<T> = std::result::Result<T, ServerError>;
