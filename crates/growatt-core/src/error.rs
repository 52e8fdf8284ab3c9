//! Error types for register extraction and domain-level configuration.

use thiserror::Error;

/// Errors produced while extracting typed values from a decrypted frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A register id was requested that falls outside every discovered
    /// window in the register map.
    #[error("register {0} is not present in any discovered window")]
    InvalidRegister(u16),

    /// A window claims register data beyond the frame's actual length.
    #[error("register data needs {needed} bytes, frame has {actual}")]
    FrameTooShort {
        /// Byte offset the read would need to reach.
        needed: usize,
        /// Actual frame length.
        actual: usize,
    },

    /// Register bytes expected to be ASCII did not decode as UTF-8.
    #[error("register {register} does not contain valid ASCII text")]
    NotAscii {
        /// Register id whose text could not be decoded.
        register: u16,
    },
}

/// Convenience alias for results in this crate.
pub type Result<T> = std::result::Result<T, CoreError>;
