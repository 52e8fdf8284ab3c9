//! Error types for the Growatt wire protocol layer.

use thiserror::Error;

/// Errors produced while parsing or building Growatt frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The buffer is too short to even contain a plain header and CRC
    /// trailer (10 bytes minimum).
    #[error("frame truncated: need at least 10 bytes, got {len}")]
    FrameTruncated {
        /// Length of the buffer that was handed to the parser.
        len: usize,
    },

    /// `declared_payload_length` in the header does not match the number of
    /// bytes actually present between the header and the CRC trailer.
    #[error(
        "length mismatch: header declares {declared} bytes, buffer has {actual} bytes of body"
    )]
    LengthMismatch {
        /// Length declared in the frame header.
        declared: usize,
        /// Length actually observed.
        actual: usize,
    },
}

/// Convenience alias for results in this crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;
