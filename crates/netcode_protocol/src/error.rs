//! # Protocol Error Types
//!
//! Errors raised while registering, encoding or decoding packets.

use thiserror::Error;

/// Errors that can occur while decoding an inbound packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The packet did not even contain an opcode byte.
    #[error("empty packet: no opcode byte")]
    Empty,

    /// The opcode is not present in the registry.
    #[error("unregistered opcode 0x{0:02X}")]
    UnknownOpcode(u8),

    /// The payload ended before a field could be read.
    #[error("unexpected end of packet: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the read required.
        needed: usize,
        /// Bytes that were left.
        remaining: usize,
    },

    /// A boolean field held something other than 0 or 1.
    #[error("invalid boolean byte {0}")]
    InvalidBool(u8),

    /// A string field was not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    /// Packet-specific validation failed.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Errors that can occur while encoding an outbound packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The packet type was never registered.
    #[error("packet type {0} is not registered")]
    Unregistered(&'static str),

    /// The encoded packet exceeds the maximum packet size.
    #[error("packet {kind} is {size} bytes, max packet size is {max}")]
    TooLarge {
        /// Name of the packet type.
        kind: &'static str,
        /// Encoded size, opcode included.
        size: usize,
        /// Configured maximum.
        max: usize,
    },
}

/// Errors that can occur while building the opcode registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two packet types claimed the same opcode.
    #[error("opcode 0x{opcode:02X} already maps to {existing}, cannot map {rejected}")]
    DuplicateOpcode {
        /// The contested opcode.
        opcode: u8,
        /// Type already holding the opcode.
        existing: &'static str,
        /// Type that was refused.
        rejected: &'static str,
    },

    /// The same packet type was registered twice.
    #[error("packet type {0} is already registered")]
    DuplicateType(&'static str),
}

/// Result type for payload reads.
pub type DecodeResult<T> = Result<T, DecodeError>;
