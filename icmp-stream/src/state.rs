//! Connection lifecycle types.
//!
//! Transitions are driven by [`crate::manager::FrameManager`]; this module
//! only names the states.
//!
//! ```text
//!  Unconnected ──connect()──▶ Connecting ──CONNRSP──▶ Connected
//!       │                                                 │
//!       └────────────── peer CONN (reply CONNRSP) ────────┤
//!                                                         │ close()
//!                                                         ▼
//!                         Closed ◀──CLOSE acked── LocalClosing
//! ```
//!
//! "Remote closed" is an orthogonal flag, not a state: the peer's CLOSE can
//! arrive in any of the states above.

/// Local lifecycle state of one frame manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No handshake attempted yet.
    #[default]
    Unconnected,
    /// CONN queued; waiting for CONNRSP.
    Connecting,
    /// Handshake complete in either direction.
    Connected,
    /// `close()` requested; buffered data and the CLOSE marker still draining.
    LocalClosing,
    /// CLOSE marker acknowledged and nothing left in flight.
    Closed,
}

impl ConnectionState {
    /// `true` while a handshake may still complete.
    pub fn awaiting_handshake(self) -> bool {
        matches!(self, Self::Unconnected | Self::Connecting)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
