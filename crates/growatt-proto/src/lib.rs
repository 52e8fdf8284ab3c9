//! Growatt datalogger wire protocol.
//!
//! Pure, no-I/O framing, masking, and packet construction for the protocol
//! spoken between Growatt solar-inverter dataloggers and their cloud
//! collector. This crate has no async runtime dependency and no knowledge
//! of sockets — it only turns bytes into typed frames and typed requests
//! back into bytes.
//!
//! # Components
//!
//! - [`header::FrameHeader`]: the 8-byte plain header every frame starts
//!   with.
//! - [`frame::RawFrame`]: a parsed frame with lazy, memoized unmasking and
//!   CRC/length validation.
//! - [`packet_type::PacketType`]: the closed set of recognized message
//!   types.
//! - [`builder`]: construction of outbound holding-register read/write
//!   requests.
//! - [`crc`] and [`mask`]: the Modbus-16 checksum and cyclic XOR masking
//!   the protocol is built from.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod crc;
pub mod errors;
pub mod frame;
pub mod header;
pub mod mask;
pub mod packet_type;

pub use builder::{Operation, build_register_packet};
pub use errors::{ProtocolError, Result};
pub use frame::RawFrame;
pub use header::FrameHeader;
pub use packet_type::PacketType;
