//! # Client Events
//!
//! Lifecycle notifications delivered to the application during drain, in
//! order with the packets around them.

use std::fmt;

/// Why the connection ended, decoded from the disconnect data word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    /// Plain server-side disconnect (code 0).
    Disconnected,
    /// Kicked by the server (code 1).
    Kicked,
    /// Banned by the server (code 2).
    Banned,
    /// Server going down for maintenance (code 3).
    Maintenance,
    /// Server restarting (code 4).
    Restarting,
    /// The application called `stop()`.
    Requested,
    /// Any other code.
    Other(u32),
}

impl DisconnectReason {
    /// Decodes the 32-bit data word of a disconnect event.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Disconnected,
            1 => Self::Kicked,
            2 => Self::Banned,
            3 => Self::Maintenance,
            4 => Self::Restarting,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Kicked => f.write_str("kicked"),
            Self::Banned => f.write_str("banned"),
            Self::Maintenance => f.write_str("disconnected for maintenance"),
            Self::Restarting => f.write_str("disconnected for a restart"),
            Self::Requested => f.write_str("disconnected on request"),
            Self::Other(code) => write!(f, "disconnected (code {code})"),
        }
    }
}

/// Lifecycle notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientEvent {
    /// The transport reported the connection as established.
    Connected,
    /// The connection ended.
    Disconnected(DisconnectReason),
    /// No acknowledgement within the peer timeout window.
    TimedOut,
    /// A transport call failed; `connect` must be called again.
    Faulted(String),
}

/// Result of one drain call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Drain {
    /// Packets whose handler ran.
    pub handled: usize,
    /// Packets skipped because their payload could not be read.
    pub failed: usize,
    /// Lifecycle events, in arrival order.
    pub events: Vec<ClientEvent>,
}

impl Drain {
    /// Returns true if nothing was drained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handled == 0 && self.failed == 0 && self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes() {
        assert_eq!(DisconnectReason::from_code(0), DisconnectReason::Disconnected);
        assert_eq!(DisconnectReason::from_code(1), DisconnectReason::Kicked);
        assert_eq!(DisconnectReason::from_code(2), DisconnectReason::Banned);
        assert_eq!(DisconnectReason::from_code(3), DisconnectReason::Maintenance);
        assert_eq!(DisconnectReason::from_code(4), DisconnectReason::Restarting);
        assert_eq!(DisconnectReason::from_code(99), DisconnectReason::Other(99));
    }

    #[test]
    fn test_reason_reads_as_sentence() {
        assert_eq!(
            format!("Client was {} from server", DisconnectReason::Kicked),
            "Client was kicked from server"
        );
        assert_eq!(DisconnectReason::Other(7).to_string(), "disconnected (code 7)");
    }
}
