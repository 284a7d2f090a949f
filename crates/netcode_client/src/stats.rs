//! # Network Statistics
//!
//! Relaxed atomic counters bumped by the worker and the drain call.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared between the worker thread and the facade.
#[derive(Debug, Default)]
pub struct NetworkStats {
    packets_sent: AtomicU64,
    bytes_sent: AtomicU64,
    packets_received: AtomicU64,
    bytes_received: AtomicU64,
    decode_errors: AtomicU64,
    oversized_dropped: AtomicU64,
    outbound_discarded: AtomicU64,
}

impl NetworkStats {
    /// Records a packet handed to the transport.
    #[inline]
    pub fn record_sent(&self, bytes: usize) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Records a packet accepted from the transport.
    #[inline]
    pub fn record_received(&self, bytes: usize) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Records a packet dropped because it could not be decoded.
    #[inline]
    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a packet dropped for exceeding the max packet size.
    #[inline]
    pub fn record_oversized(&self) {
        self.oversized_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records outbound packets thrown away by a stop request.
    #[inline]
    pub fn record_discarded(&self, count: usize) {
        self.outbound_discarded
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            oversized_dropped: self.oversized_dropped.load(Ordering::Relaxed),
            outbound_discarded: self.outbound_discarded.load(Ordering::Relaxed),
        }
    }
}

/// Copy of the counters at one point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Packets handed to the transport.
    pub packets_sent: u64,
    /// Bytes handed to the transport, opcodes included.
    pub bytes_sent: u64,
    /// Packets accepted from the transport.
    pub packets_received: u64,
    /// Bytes accepted from the transport.
    pub bytes_received: u64,
    /// Packets dropped on unknown opcode or malformed payload.
    pub decode_errors: u64,
    /// Packets dropped for exceeding the max packet size.
    pub oversized_dropped: u64,
    /// Outbound packets discarded by a stop request.
    pub outbound_discarded: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = NetworkStats::default();
        stats.record_sent(10);
        stats.record_sent(5);
        stats.record_received(7);
        stats.record_decode_error();
        stats.record_oversized();
        stats.record_discarded(3);

        let snap = stats.snapshot();
        assert_eq!(snap.packets_sent, 2);
        assert_eq!(snap.bytes_sent, 15);
        assert_eq!(snap.packets_received, 1);
        assert_eq!(snap.bytes_received, 7);
        assert_eq!(snap.decode_errors, 1);
        assert_eq!(snap.oversized_dropped, 1);
        assert_eq!(snap.outbound_discarded, 3);
    }
}
