//! # Netcode Protocol
//!
//! Typed packets on top of a single-byte opcode table.
//!
//! ## Wire Format
//!
//! ```text
//! ┌────────────┬──────────────────────────────────────────────┐
//! │ Opcode (1) │ Payload (variable, little-endian primitives) │
//! └────────────┴──────────────────────────────────────────────┘
//!   total length <= MAX_PACKET_SIZE
//! ```
//!
//! ## Registration
//!
//! Every packet type is registered exactly once, before the first client is
//! created. The resulting [`OpcodeRegistry`] is immutable and shared between
//! the application thread and the connection worker.
//!
//! ```rust,ignore
//! use netcode_protocol::RegistryBuilder;
//!
//! let registry = RegistryBuilder::<Game>::new()
//!     .register::<Ping>(0x01)?
//!     .register::<Move>(0x02)?
//!     .build();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod packet;
pub mod reader;
pub mod registry;
pub mod writer;

pub use error::{DecodeError, DecodeResult, EncodeError, RegistryError};
pub use packet::{DeliveryMode, Packet, PacketKind};
pub use reader::PacketReader;
pub use registry::{DecodedPacket, EncodedPacket, OpcodeRegistry, RegistryBuilder};
pub use writer::PacketWriter;

/// Maximum size of a packet on the wire, opcode byte included.
///
/// Larger packets are rejected on encode and dropped on receive.
pub const MAX_PACKET_SIZE: usize = 8192;

/// Transport channel carrying all traffic.
pub const CHANNEL_ID: u8 = 0;

/// Size of the opcode prefix in bytes.
pub const OPCODE_SIZE: usize = 1;
