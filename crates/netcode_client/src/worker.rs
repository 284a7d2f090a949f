//! # Connection Worker
//!
//! Owns the transport for one connection and runs on its own thread.
//!
//! ## Iteration
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ 1. service transport   (bounded wait, then poll to a cap)  │
//! │ 2. control commands    (stop requests, before outbound)    │
//! │ 3. decode staged raws  (→ decoded queue)                   │
//! │ 4. flush outbound      (only while Connected)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The bounded wait in step 1 is the only place the worker sleeps.
//! Disconnect, timeout, a stop request or a transport fault end the loop
//! after the current iteration.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use netcode_protocol::{OpcodeRegistry, PacketKind, CHANNEL_ID};
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::events::{ClientEvent, DisconnectReason};
use crate::queue::{ControlCommand, Inbound, WorkerQueues};
use crate::state::{ConnectionState, SharedState};
use crate::transport::{PeerSettings, Transport, TransportEvent};

pub(crate) struct ConnectionWorker<C, T> {
    transport: T,
    registry: Arc<OpcodeRegistry<C>>,
    shared: Arc<SharedState>,
    queues: WorkerQueues<C>,
    ignored: Arc<HashSet<PacketKind>>,
    peer: PeerSettings,
    service_timeout: Duration,
    max_events: usize,
    /// Cleared by anything that ends the connection.
    running: bool,
    /// Set once a stop request has been acted on.
    stopping: bool,
}

impl<C: 'static, T: Transport> ConnectionWorker<C, T> {
    pub(crate) fn new(
        transport: T,
        registry: Arc<OpcodeRegistry<C>>,
        shared: Arc<SharedState>,
        queues: WorkerQueues<C>,
        ignored: Arc<HashSet<PacketKind>>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            shared,
            queues,
            ignored,
            peer: config.peer_settings(),
            service_timeout: config.service_timeout(),
            max_events: config.max_events_per_iteration.max(1),
            running: true,
            stopping: false,
        }
    }

    /// Thread body: connect, loop until the connection ends, clean up.
    pub(crate) fn run(mut self, host: &str, port: u16) {
        info!(host, port, "Connecting to server");
        if let Err(err) = self.transport.connect(host, port, &self.peer) {
            self.fault(&err);
        }

        while self.running {
            if let Err(err) = self.iterate() {
                self.fault(&err);
            }
        }

        self.transport.close();
        self.shared.store(ConnectionState::Disconnected);
        info!("Client is no longer running");
    }

    pub(crate) fn iterate(&mut self) -> Result<(), TransportError> {
        self.service_events()?;
        self.process_control()?;
        self.decode_staged();
        self.flush_outbound()
    }

    fn service_events(&mut self) -> Result<(), TransportError> {
        let mut wait = self.service_timeout;
        for _ in 0..self.max_events {
            let Some(event) = self.transport.service(wait)? else {
                break;
            };
            wait = Duration::ZERO;
            self.on_event(event);
            if !self.running {
                break;
            }
        }
        Ok(())
    }

    fn on_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connect => {
                self.shared.store(ConnectionState::Connected);
                info!("Client connected to server");
                self.queues.publish(Inbound::Event(ClientEvent::Connected));
            }
            TransportEvent::Receive(data) => self.on_receive(data),
            TransportEvent::Disconnect(code) => {
                let reason = DisconnectReason::from_code(code);
                info!(code, "Client was {reason} from server");
                self.shared.store(ConnectionState::Disconnected);
                self.queues
                    .publish(Inbound::Event(ClientEvent::Disconnected(reason)));
                self.running = false;
            }
            TransportEvent::Timeout => {
                warn!("Client connection timeout");
                self.shared.store(ConnectionState::TimedOut);
                self.queues.publish(Inbound::Event(ClientEvent::TimedOut));
                self.running = false;
            }
        }
    }

    fn on_receive(&mut self, data: Vec<u8>) {
        let max = self.registry.max_packet_size();
        if data.len() > max {
            warn!(
                len = data.len(),
                max,
                "Tried to read packet from server of size {} when max packet size is {}",
                data.len(),
                max
            );
            self.shared.stats.record_oversized();
            return;
        }
        self.shared.stats.record_received(data.len());
        self.queues.stage(data);
    }

    fn process_control(&mut self) -> Result<(), TransportError> {
        while let Some(command) = self.queues.next_command() {
            match command {
                ControlCommand::Disconnect if self.stopping => {
                    debug!("Client is in the middle of stopping");
                }
                ControlCommand::Disconnect => self.begin_stop()?,
            }
        }
        Ok(())
    }

    fn begin_stop(&mut self) -> Result<(), TransportError> {
        self.stopping = true;

        // The connection may already have ended earlier in this iteration
        if self.running {
            self.transport.disconnect(0)?;
            self.shared.store(ConnectionState::Disconnecting);
            self.queues
                .publish(Inbound::Event(ClientEvent::Disconnected(
                    DisconnectReason::Requested,
                )));
            self.running = false;
        }

        let discarded = self.queues.discard_outbound();
        if discarded > 0 {
            debug!(discarded, "Discarded outbound packets on stop");
            self.shared.stats.record_discarded(discarded);
        }
        Ok(())
    }

    fn decode_staged(&mut self) {
        while let Some(raw) = self.queues.next_staged() {
            match self.registry.decode(raw) {
                Ok(packet) => {
                    debug!(opcode = packet.opcode(), kind = %packet.kind(), "Decoded packet");
                    self.queues.publish(Inbound::Packet(packet));
                }
                Err(err) => {
                    warn!(%err, "Dropping packet from server");
                    self.shared.stats.record_decode_error();
                }
            }
        }
    }

    fn flush_outbound(&mut self) -> Result<(), TransportError> {
        if self.stopping || self.shared.load() != ConnectionState::Connected {
            return Ok(());
        }

        for _ in 0..self.queues.outbound_len() {
            let Some(packet) = self.queues.next_outbound() else {
                break;
            };
            self.transport
                .send(CHANNEL_ID, &packet.payload, packet.mode)?;
            self.shared.stats.record_sent(packet.payload.len());

            if let Some(kind) = self.registry.kind_of(packet.opcode) {
                if !self.ignored.contains(&kind) {
                    info!(opcode = packet.opcode, len = packet.payload.len(), "Sent packet: {kind}");
                }
            }
        }
        Ok(())
    }

    fn fault(&mut self, err: &TransportError) {
        error!(%err, "Transport fault, stopping client");
        self.queues
            .publish(Inbound::Event(ClientEvent::Faulted(err.to_string())));
        self.running = false;
    }
}
