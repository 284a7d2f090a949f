//! # Transport Layer
//!
//! The reliable-UDP host/peer seam the connection worker drives.
//!
//! ## Design
//!
//! - One transport per connection attempt, opened by a [`Connector`]
//! - Owned and serviced exclusively by the worker thread
//! - Events are pulled with [`Transport::service`]; the first call of each
//!   worker iteration waits, the rest poll
//!
//! The wire-level reliability protocol is the transport's business. The
//! worker only sees connect, receive, disconnect and timeout.

pub mod memory;

use std::time::Duration;

use netcode_protocol::DeliveryMode;

use crate::error::TransportError;

/// Per-peer keep-alive and timeout settings applied on connect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeerSettings {
    /// Interval between keep-alive pings.
    pub ping_interval: Duration,
    /// Timeout limit.
    pub timeout: Duration,
    /// Minimum time without acknowledgement before timing out.
    pub timeout_min: Duration,
    /// Maximum time without acknowledgement before timing out.
    pub timeout_max: Duration,
}

/// Event produced by servicing a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// The peer connection is established.
    Connect,
    /// A packet arrived.
    Receive(Vec<u8>),
    /// The peer disconnected; carries the disconnect data word.
    Disconnect(u32),
    /// The peer stopped acknowledging within the timeout window.
    Timeout,
}

/// A reliable-UDP client host with a single peer.
pub trait Transport: Send + 'static {
    /// Starts connecting to `host:port`. Completion is reported as
    /// [`TransportEvent::Connect`].
    ///
    /// # Errors
    ///
    /// Returns error if the host is invalid or the socket cannot be created.
    fn connect(&mut self, host: &str, port: u16, peer: &PeerSettings)
        -> Result<(), TransportError>;

    /// Waits up to `timeout` for the next event. A zero timeout polls.
    ///
    /// # Errors
    ///
    /// Returns error on any transport failure.
    fn service(&mut self, timeout: Duration) -> Result<Option<TransportEvent>, TransportError>;

    /// Queues `data` for the peer on `channel`.
    ///
    /// # Errors
    ///
    /// Returns error on any transport failure.
    fn send(&mut self, channel: u8, data: &[u8], mode: DeliveryMode)
        -> Result<(), TransportError>;

    /// Starts a graceful disconnect carrying `data`.
    ///
    /// # Errors
    ///
    /// Returns error on any transport failure.
    fn disconnect(&mut self, data: u32) -> Result<(), TransportError>;

    /// Releases the host. Called once when the worker exits.
    fn close(&mut self) {}
}

/// Opens a fresh transport for each connection attempt.
///
/// Any `FnMut() -> Result<T, TransportError>` closure is a connector.
pub trait Connector {
    /// Transport produced by this connector.
    type Transport: Transport;

    /// Creates a transport. Runs on the application thread inside `connect`.
    ///
    /// # Errors
    ///
    /// Returns error if the host cannot be created.
    fn open(&mut self) -> Result<Self::Transport, TransportError>;
}

impl<T, F> Connector for F
where
    T: Transport,
    F: FnMut() -> Result<T, TransportError>,
{
    type Transport = T;

    fn open(&mut self) -> Result<T, TransportError> {
        self()
    }
}
