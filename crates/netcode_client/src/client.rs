//! # Game Client
//!
//! Application-facing facade over the connection worker.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      APPLICATION THREAD                     │
//! │   connect() / send() / stop()        drain_and_handle(ctx)  │
//! └──────────┬──────────────────────────────────────▲───────────┘
//!            │ outbound / control                   │ decoded
//! ┌──────────▼──────────────────────────────────────┴───────────┐
//! │                   WORKER THREAD (netcode-client)            │
//! │   service transport → stage → decode → publish              │
//! │   control → flush outbound (Connected only)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Packet handlers never run on the worker thread: they run inside
//! [`Client::drain_and_handle`], once per application tick.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use netcode_protocol::{DeliveryMode, OpcodeRegistry, Packet, PacketKind};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::events::Drain;
use crate::queue::{ClientQueues, ControlCommand, Inbound, PacketSender};
use crate::state::{ConnectionState, SharedState};
use crate::stats::StatsSnapshot;
use crate::transport::Connector;
use crate::worker::ConnectionWorker;

/// Name of the connection worker thread.
pub const WORKER_THREAD_NAME: &str = "netcode-client";

/// Game client.
///
/// `C` is the application context packet handlers mutate, `K` opens the
/// transport for each connection attempt.
pub struct Client<C, K> {
    registry: Arc<OpcodeRegistry<C>>,
    config: ClientConfig,
    connector: K,
    queues: ClientQueues<C>,
    sender: PacketSender<C>,
    shared: Arc<SharedState>,
    /// Packet kinds excluded from per-packet logging.
    ignored: Arc<HashSet<PacketKind>>,
    worker: Option<JoinHandle<()>>,
}

impl<C: 'static, K: Connector> Client<C, K> {
    /// Creates a disconnected client.
    #[must_use]
    pub fn new(registry: Arc<OpcodeRegistry<C>>, config: ClientConfig, connector: K) -> Self {
        let queues = ClientQueues::new();
        let sender = PacketSender::new(Arc::clone(&registry), queues.outbound());
        Self {
            registry,
            config,
            connector,
            queues,
            sender,
            shared: Arc::new(SharedState::default()),
            ignored: Arc::new(HashSet::new()),
            worker: None,
        }
    }

    /// Starts connecting to `host:port` on a new worker thread.
    ///
    /// Returns as soon as the worker is running; completion is reported
    /// as [`ClientEvent::Connected`](crate::ClientEvent::Connected) by a
    /// later drain. Packets of the `ignored` kinds are not logged.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AlreadyActive`] unless the client is
    /// disconnected, or an error if the transport or thread cannot be created.
    pub fn connect(&mut self, host: &str, port: u16, ignored: &[PacketKind]) -> ClientResult<()> {
        let state = self.shared.load();
        if state.is_active() {
            return Err(ClientError::AlreadyActive(state));
        }

        self.join_worker();
        let stale = self.queues.clear_control();
        if stale > 0 {
            debug!(stale, "Dropped stop requests no worker picked up");
        }

        let transport = self.connector.open()?;
        self.ignored = Arc::new(ignored.iter().copied().collect());

        let worker = ConnectionWorker::new(
            transport,
            Arc::clone(&self.registry),
            Arc::clone(&self.shared),
            self.queues.worker_side(),
            Arc::clone(&self.ignored),
            &self.config,
        );

        self.shared.store(ConnectionState::Connecting);
        let host = host.to_string();
        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker.run(&host, port));

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.shared.store(ConnectionState::Disconnected);
                Err(ClientError::Spawn(err))
            }
        }
    }

    /// Encodes `packet` and queues it for the worker.
    ///
    /// Packets queued while not connected are held and transmitted in order
    /// once a connection is established.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Encode`] if the packet cannot be encoded.
    pub fn send<P: Packet<C>>(&self, packet: &P, mode: DeliveryMode) -> ClientResult<()> {
        self.sender.send(packet, mode)
    }

    /// Returns a clonable handle for sending from other threads.
    #[must_use]
    pub fn sender(&self) -> PacketSender<C> {
        self.sender.clone()
    }

    /// Runs every queued packet handler against `ctx` and collects lifecycle
    /// events.
    ///
    /// Drains what is queued when the call starts; packets arriving during
    /// the drain wait for the next one.
    pub fn drain_and_handle(&mut self, ctx: &mut C) -> Drain {
        let mut drain = Drain::default();

        for _ in 0..self.queues.pending_decoded() {
            let Some(item) = self.queues.pop_decoded() else {
                break;
            };
            let packet = match item {
                Inbound::Event(event) => {
                    drain.events.push(event);
                    continue;
                }
                Inbound::Packet(packet) => packet,
            };

            let kind = packet.kind();
            match packet.read() {
                Ok(handler) => {
                    handler.handle(ctx);
                    drain.handled += 1;
                    if !self.ignored.contains(&kind) {
                        info!(kind = %kind, "Received packet: {kind}\n{handler:#?}");
                    }
                }
                Err(err) => {
                    drain.failed += 1;
                    self.shared.stats.record_decode_error();
                    warn!(kind = %kind, %err, "Failed to read packet payload");
                }
            }
        }

        drain
    }

    /// Requests a graceful disconnect. No-op while disconnected.
    ///
    /// Queued outbound packets are discarded by the worker. Calling this
    /// again before the worker exits has no further effect.
    pub fn stop(&self) {
        if !self.shared.load().is_active() {
            return;
        }
        info!("Requesting to stop client..");
        self.queues.request(ControlCommand::Disconnect);
    }

    /// Returns true only while connected.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.load() == ConnectionState::Connected
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.load()
    }

    /// Returns a snapshot of the network counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Returns the opcode registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<OpcodeRegistry<C>> {
        &self.registry
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Writes a client-tagged line to the log.
    pub fn log(&self, message: impl fmt::Display) {
        info!("[Client] {message}");
    }
}

impl<C, K> Client<C, K> {
    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("Connection worker panicked");
            }
        }
    }
}

impl<C, K> Drop for Client<C, K> {
    fn drop(&mut self) {
        if self.shared.load().is_active() {
            self.queues.request(ControlCommand::Disconnect);
        }
        self.join_worker();
    }
}

impl<C: 'static, K> fmt::Debug for Client<C, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.shared.load())
            .field("registered", &self.registry.len())
            .field("worker", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}
