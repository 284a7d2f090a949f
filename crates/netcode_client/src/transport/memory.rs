//! # In-Memory Transport
//!
//! Channel-backed [`Transport`] for tests and local demos.
//!
//! A [`MemoryServer`] plays the remote peer: it scripts the events the
//! client's transport will report and observes everything the client sends.
//! Each call of its connector opens a new [`MemoryTransport`] wired to the
//! same server.
//!
//! Like a real reliable-UDP host, a transport that never sees `Connect`
//! reports `Timeout` once the peer timeout has elapsed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use netcode_protocol::DeliveryMode;
use parking_lot::Mutex;

use super::{PeerSettings, Transport, TransportEvent};
use crate::error::TransportError;

#[derive(Debug)]
enum Script {
    Event(TransportEvent),
    Fault(String),
}

/// A packet the client handed to its transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentPacket {
    /// Channel the packet was sent on.
    pub channel: u8,
    /// Requested delivery mode.
    pub mode: DeliveryMode,
    /// Opcode followed by payload.
    pub data: Vec<u8>,
}

impl SentPacket {
    /// Opcode of the packet, if it has one.
    #[must_use]
    pub fn opcode(&self) -> Option<u8> {
        self.data.first().copied()
    }
}

#[derive(Debug, Default)]
struct Ledger {
    opened: usize,
    closed: usize,
    target: Option<(String, u16)>,
    peer: Option<PeerSettings>,
    disconnects: Vec<u32>,
}

/// Server end of the in-memory network.
#[derive(Clone, Debug)]
pub struct MemoryServer {
    script_tx: Sender<Script>,
    script_rx: Receiver<Script>,
    sent_tx: Sender<SentPacket>,
    sent_rx: Receiver<SentPacket>,
    ledger: Arc<Mutex<Ledger>>,
}

impl Default for MemoryServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryServer {
    /// Creates a server with no pending events.
    #[must_use]
    pub fn new() -> Self {
        let (script_tx, script_rx) = unbounded();
        let (sent_tx, sent_rx) = unbounded();
        Self {
            script_tx,
            script_rx,
            sent_tx,
            sent_rx,
            ledger: Arc::new(Mutex::new(Ledger::default())),
        }
    }

    /// Returns a connector that opens transports wired to this server.
    pub fn connector(
        &self,
    ) -> impl FnMut() -> Result<MemoryTransport, TransportError> + Send + 'static {
        let server = self.clone();
        move || Ok(server.open())
    }

    fn open(&self) -> MemoryTransport {
        self.ledger.lock().opened += 1;
        MemoryTransport {
            script: self.script_rx.clone(),
            sent: self.sent_tx.clone(),
            ledger: Arc::clone(&self.ledger),
            connect_deadline: None,
        }
    }

    fn push(&self, script: Script) {
        // Cannot fail: the server holds its own receiver
        let _ = self.script_tx.send(script);
    }

    /// Accepts the pending connection.
    pub fn accept(&self) {
        self.push(Script::Event(TransportEvent::Connect));
    }

    /// Delivers a raw packet (opcode first) to the client.
    pub fn deliver(&self, data: impl Into<Vec<u8>>) {
        self.push(Script::Event(TransportEvent::Receive(data.into())));
    }

    /// Disconnects the client with the given data word.
    pub fn kick(&self, code: u32) {
        self.push(Script::Event(TransportEvent::Disconnect(code)));
    }

    /// Makes the client's transport report a timeout.
    pub fn time_out(&self) {
        self.push(Script::Event(TransportEvent::Timeout));
    }

    /// Makes the next service call on the client's transport fail.
    pub fn fault(&self, message: impl Into<String>) {
        self.push(Script::Fault(message.into()));
    }

    /// Waits up to `timeout` for the next packet the client sent.
    #[must_use]
    pub fn recv_sent(&self, timeout: Duration) -> Option<SentPacket> {
        self.sent_rx.recv_timeout(timeout).ok()
    }

    /// Takes every packet the client has sent so far.
    #[must_use]
    pub fn drain_sent(&self) -> Vec<SentPacket> {
        self.sent_rx.try_iter().collect()
    }

    /// Number of graceful disconnects the client initiated.
    #[must_use]
    pub fn disconnect_calls(&self) -> usize {
        self.ledger.lock().disconnects.len()
    }

    /// Data words of the graceful disconnects, in order.
    #[must_use]
    pub fn disconnect_codes(&self) -> Vec<u32> {
        self.ledger.lock().disconnects.clone()
    }

    /// Host and port of the most recent connect.
    #[must_use]
    pub fn last_target(&self) -> Option<(String, u16)> {
        self.ledger.lock().target.clone()
    }

    /// Peer settings of the most recent connect.
    #[must_use]
    pub fn peer_settings(&self) -> Option<PeerSettings> {
        self.ledger.lock().peer
    }

    /// Number of transports opened through the connector.
    #[must_use]
    pub fn transports_opened(&self) -> usize {
        self.ledger.lock().opened
    }

    /// Number of transports the client has closed.
    #[must_use]
    pub fn transports_closed(&self) -> usize {
        self.ledger.lock().closed
    }
}

/// Client end of the in-memory network.
#[derive(Debug)]
pub struct MemoryTransport {
    script: Receiver<Script>,
    sent: Sender<SentPacket>,
    ledger: Arc<Mutex<Ledger>>,
    connect_deadline: Option<Instant>,
}

impl Transport for MemoryTransport {
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        peer: &PeerSettings,
    ) -> Result<(), TransportError> {
        if host.is_empty() {
            return Err(TransportError::InvalidAddress(format!(":{port}")));
        }

        let mut ledger = self.ledger.lock();
        ledger.target = Some((host.to_string(), port));
        ledger.peer = Some(*peer);
        self.connect_deadline = Some(Instant::now() + peer.timeout);
        Ok(())
    }

    fn service(&mut self, timeout: Duration) -> Result<Option<TransportEvent>, TransportError> {
        let now = Instant::now();
        let wait = match self.connect_deadline {
            Some(deadline) if deadline <= now => {
                self.connect_deadline = None;
                return Ok(Some(TransportEvent::Timeout));
            }
            Some(deadline) => timeout.min(deadline - now),
            None => timeout,
        };

        match self.script.recv_timeout(wait) {
            Ok(Script::Event(event)) => {
                if event == TransportEvent::Connect {
                    self.connect_deadline = None;
                }
                Ok(Some(event))
            }
            Ok(Script::Fault(message)) => Err(TransportError::Fault(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Closed),
        }
    }

    fn send(&mut self, channel: u8, data: &[u8], mode: DeliveryMode) -> Result<(), TransportError> {
        self.sent
            .send(SentPacket {
                channel,
                mode,
                data: data.to_vec(),
            })
            .map_err(|_| TransportError::Closed)
    }

    fn disconnect(&mut self, data: u32) -> Result<(), TransportError> {
        self.ledger.lock().disconnects.push(data);
        Ok(())
    }

    fn close(&mut self) {
        self.ledger.lock().closed += 1;
    }
}
