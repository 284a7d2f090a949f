//! # Connection State
//!
//! Lifecycle state of the client, published by the worker through an atomic.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::stats::NetworkStats;

/// Connection lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    /// No worker is running.
    #[default]
    Disconnected = 0,
    /// Worker started, waiting for the transport's connect event.
    Connecting = 1,
    /// Connect event received; outbound packets are flushed.
    Connected = 2,
    /// Stop requested, graceful disconnect sent.
    Disconnecting = 3,
    /// The transport reported a timeout; the worker is winding down.
    TimedOut = 4,
}

impl ConnectionState {
    /// Converts the raw atomic value back into a state.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disconnected),
            1 => Some(Self::Connecting),
            2 => Some(Self::Connected),
            3 => Some(Self::Disconnecting),
            4 => Some(Self::TimedOut),
            _ => None,
        }
    }

    /// Returns true while a worker owns (or is about to own) a transport.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
            Self::TimedOut => "timed out",
        };
        f.write_str(name)
    }
}

/// State shared between the facade and the worker.
#[derive(Debug, Default)]
pub(crate) struct SharedState {
    state: AtomicU8,
    pub(crate) stats: NetworkStats,
}

impl SharedState {
    #[inline]
    pub(crate) fn load(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire)).unwrap_or_default()
    }

    #[inline]
    pub(crate) fn store(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }
}
