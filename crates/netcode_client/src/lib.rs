//! # Netcode Client
//!
//! Background-threaded game client over a reliable-UDP transport.
//!
//! ## Architecture
//!
//! - **Worker**: one thread per connection owns and services the transport
//! - **Queues**: lock-free channels are the only link to the application
//! - **Dispatch**: inbound packets are decoded by opcode on the worker and
//!   applied to the application context on the application thread
//!
//! ## Threading Model
//!
//! ```text
//! APPLICATION                        WORKER
//!   |--- send(packet) -------------->|
//!   |                                |--- transport.send (Connected only)
//!   |                                |<-- transport.service
//!   |<-- decoded packets / events ---|
//!   |                                |
//!   drain_and_handle(ctx): handlers run here, never on the worker
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use netcode_client::{Client, ClientConfig, DeliveryMode, MemoryServer, RegistryBuilder};
//!
//! let registry = Arc::new(RegistryBuilder::<Game>::new().register::<Ping>(0x01)?.build());
//! let server = MemoryServer::new();
//! let mut client = Client::new(registry, ClientConfig::default(), server.connector());
//!
//! client.connect("localhost", 7777, &[])?;
//! client.send(&Ping, DeliveryMode::Reliable)?;
//!
//! loop {
//!     let drain = client.drain_and_handle(&mut game);
//!     // ...
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod queue;
pub mod state;
pub mod stats;
pub mod transport;
mod worker;

// Re-exports for convenience
pub use client::{Client, WORKER_THREAD_NAME};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ConfigError, TransportError};
pub use events::{ClientEvent, Drain, DisconnectReason};
pub use queue::{OutboundPacket, PacketSender};
pub use state::ConnectionState;
pub use stats::{NetworkStats, StatsSnapshot};
pub use transport::memory::{MemoryServer, MemoryTransport, SentPacket};
pub use transport::{Connector, PeerSettings, Transport, TransportEvent};

pub use netcode_protocol::{
    DecodeError, DecodeResult, DeliveryMode, EncodeError, OpcodeRegistry, Packet, PacketKind,
    PacketReader, PacketWriter, RegistryBuilder, RegistryError, CHANNEL_ID, MAX_PACKET_SIZE,
};
