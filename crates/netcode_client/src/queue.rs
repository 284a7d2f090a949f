//! # Queue Router
//!
//! The channels between the application thread and the connection worker.
//!
//! ```text
//!   application                                  worker
//!   ───────────                                  ──────
//!   send() ─────────── outbound (MPSC) ─────────▶ flush (Connected only)
//!   stop() ─────────── control  (MPSC) ─────────▶ drained before outbound
//!   drain() ◀───────── decoded  (SPSC) ────────── decode ◀── staged (local)
//! ```
//!
//! The queues belong to the client, not to a worker: packets sent while no
//! worker is connected stay queued for the next connection.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use netcode_protocol::{DecodedPacket, DeliveryMode, OpcodeRegistry, Packet};
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::events::ClientEvent;

/// An encoded packet waiting to be handed to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundPacket {
    /// Opcode of the packet type.
    pub opcode: u8,
    /// Requested delivery mode.
    pub mode: DeliveryMode,
    /// Opcode followed by payload.
    pub payload: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ControlCommand {
    Disconnect,
}

/// Item of the decoded queue: packets and lifecycle events share one
/// queue so the application sees them in arrival order.
pub(crate) enum Inbound<C> {
    Packet(DecodedPacket<C>),
    Event(ClientEvent),
}

/// Application-side ends of every queue.
pub(crate) struct ClientQueues<C> {
    outbound_tx: Sender<OutboundPacket>,
    outbound_rx: Receiver<OutboundPacket>,
    control_tx: Sender<ControlCommand>,
    control_rx: Receiver<ControlCommand>,
    decoded_tx: Sender<Inbound<C>>,
    decoded_rx: Receiver<Inbound<C>>,
}

impl<C> ClientQueues<C> {
    pub(crate) fn new() -> Self {
        let (outbound_tx, outbound_rx) = unbounded();
        let (control_tx, control_rx) = unbounded();
        let (decoded_tx, decoded_rx) = unbounded();
        Self {
            outbound_tx,
            outbound_rx,
            control_tx,
            control_rx,
            decoded_tx,
            decoded_rx,
        }
    }

    /// Ends handed to a new worker.
    pub(crate) fn worker_side(&self) -> WorkerQueues<C> {
        WorkerQueues {
            outbound: self.outbound_rx.clone(),
            control: self.control_rx.clone(),
            decoded: self.decoded_tx.clone(),
            staged: VecDeque::new(),
        }
    }

    pub(crate) fn outbound(&self) -> Sender<OutboundPacket> {
        self.outbound_tx.clone()
    }

    pub(crate) fn request(&self, command: ControlCommand) {
        // Cannot fail: the receiver lives in self
        let _ = self.control_tx.send(command);
    }

    /// Drops commands no worker picked up.
    pub(crate) fn clear_control(&self) -> usize {
        self.control_rx.try_iter().count()
    }

    pub(crate) fn pending_decoded(&self) -> usize {
        self.decoded_rx.len()
    }

    pub(crate) fn pop_decoded(&self) -> Option<Inbound<C>> {
        self.decoded_rx.try_recv().ok()
    }
}

/// Worker-side ends, plus the worker-local raw staging queue.
pub(crate) struct WorkerQueues<C> {
    outbound: Receiver<OutboundPacket>,
    control: Receiver<ControlCommand>,
    decoded: Sender<Inbound<C>>,
    staged: VecDeque<Vec<u8>>,
}

impl<C> WorkerQueues<C> {
    pub(crate) fn next_command(&self) -> Option<ControlCommand> {
        self.control.try_recv().ok()
    }

    /// Outbound packets queued right now. Bounds one flush.
    pub(crate) fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    pub(crate) fn next_outbound(&self) -> Option<OutboundPacket> {
        self.outbound.try_recv().ok()
    }

    pub(crate) fn discard_outbound(&self) -> usize {
        self.outbound.try_iter().count()
    }

    pub(crate) fn stage(&mut self, raw: Vec<u8>) {
        self.staged.push_back(raw);
    }

    pub(crate) fn next_staged(&mut self) -> Option<Vec<u8>> {
        self.staged.pop_front()
    }

    pub(crate) fn publish(&self, item: Inbound<C>) {
        // Fails only once the client is gone; nobody is left to drain
        let _ = self.decoded.send(item);
    }
}

/// Clonable handle for sending packets from any thread.
///
/// Encodes on the calling thread, then queues without blocking.
pub struct PacketSender<C> {
    registry: Arc<OpcodeRegistry<C>>,
    outbound: Sender<OutboundPacket>,
}

impl<C: 'static> PacketSender<C> {
    pub(crate) fn new(registry: Arc<OpcodeRegistry<C>>, outbound: Sender<OutboundPacket>) -> Self {
        Self { registry, outbound }
    }

    /// Encodes `packet` and queues it for the worker.
    ///
    /// Accepted in any connection state; the worker transmits queued
    /// packets in order once connected.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Encode`] if the packet type is unregistered or
    /// too large, [`ClientError::Closed`] if the client was dropped.
    pub fn send<P: Packet<C>>(&self, packet: &P, mode: DeliveryMode) -> ClientResult<()> {
        let encoded = self.registry.encode(packet)?;
        debug!(
            opcode = encoded.opcode,
            len = encoded.bytes.len(),
            "Queued outbound packet"
        );
        self.outbound
            .send(OutboundPacket {
                opcode: encoded.opcode,
                mode,
                payload: encoded.bytes,
            })
            .map_err(|_| ClientError::Closed)
    }
}

impl<C> Clone for PacketSender<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            outbound: self.outbound.clone(),
        }
    }
}

impl<C> fmt::Debug for PacketSender<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketSender")
            .field("queued", &self.outbound.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcode_protocol::RegistryBuilder;

    #[derive(Debug, Default)]
    struct Ping;

    impl Packet<()> for Ping {}

    #[derive(Debug, Default)]
    struct Pong;

    impl Packet<()> for Pong {}

    fn sender(queues: &ClientQueues<()>) -> PacketSender<()> {
        let registry = RegistryBuilder::new().register::<Ping>(0x01).unwrap().build();
        PacketSender::new(Arc::new(registry), queues.outbound())
    }

    #[test]
    fn test_send_queues_encoded_packet() {
        let queues = ClientQueues::<()>::new();
        let worker = queues.worker_side();
        sender(&queues).send(&Ping, DeliveryMode::Unreliable).unwrap();

        assert_eq!(worker.outbound_len(), 1);
        assert_eq!(
            worker.next_outbound(),
            Some(OutboundPacket {
                opcode: 0x01,
                mode: DeliveryMode::Unreliable,
                payload: vec![0x01],
            })
        );
    }

    #[test]
    fn test_unregistered_send_queues_nothing() {
        let queues = ClientQueues::<()>::new();
        let worker = queues.worker_side();
        let err = sender(&queues).send(&Pong, DeliveryMode::Reliable).unwrap_err();
        assert!(matches!(err, ClientError::Encode(_)));
        assert_eq!(worker.outbound_len(), 0);
    }

    #[test]
    fn test_outbound_survives_worker() {
        let queues = ClientQueues::<()>::new();
        let handle = sender(&queues);
        drop(queues.worker_side());

        handle.send(&Ping, DeliveryMode::Reliable).unwrap();
        handle.send(&Ping, DeliveryMode::Reliable).unwrap();
        assert_eq!(queues.worker_side().discard_outbound(), 2);
    }

    #[test]
    fn test_clear_control() {
        let queues = ClientQueues::<()>::new();
        queues.request(ControlCommand::Disconnect);
        queues.request(ControlCommand::Disconnect);
        assert_eq!(queues.clear_control(), 2);
        assert_eq!(queues.worker_side().next_command(), None);
    }

    #[test]
    fn test_decoded_fifo() {
        let queues = ClientQueues::<()>::new();
        let worker = queues.worker_side();
        worker.publish(Inbound::Event(ClientEvent::Connected));
        worker.publish(Inbound::Event(ClientEvent::TimedOut));

        assert_eq!(queues.pending_decoded(), 2);
        assert!(matches!(
            queues.pop_decoded(),
            Some(Inbound::Event(ClientEvent::Connected))
        ));
        assert!(matches!(
            queues.pop_decoded(),
            Some(Inbound::Event(ClientEvent::TimedOut))
        ));
        assert!(queues.pop_decoded().is_none());
    }
}
