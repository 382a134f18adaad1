//! Session types: the server's record of a (player, room) association.
//!
//! A session is the durable half of a player's presence: the transport
//! connection may come and go, but the session — and the room slot it
//! points at — survives until an explicit leave or a grace-period
//! eviction.

use std::time::{Duration, Instant};

use keyrace_protocol::{PlayerId, RoomId};
use keyrace_transport::ConnectionId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a disconnected player's room slot is preserved before
    /// eviction. A returning connection presenting the session token
    /// within this window reclaims the slot.
    pub reconnect_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_grace: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Whether the session currently has a live transport connection.
///
/// ```text
///   Connected ──(transport drop)──→ Disconnected ──(grace elapses)──→ evicted
///       ↑                                │
///       └──────(resume with token)───────┘
/// ```
///
/// `Instant` (monotonic) rather than wall time: the grace window must
/// not jump with system clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// A live connection is attached.
    Connected(ConnectionId),

    /// The transport dropped at `since`; the room slot is held until
    /// `since + reconnect_grace`.
    Disconnected { since: Instant },
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One player's (player, room) association and reconnect credentials.
///
/// This mapping is a back-reference, never authoritative — the room
/// registry owns the player; invalidating a session must never be able
/// to corrupt room state.
#[derive(Debug, Clone)]
pub struct Session {
    pub player_id: PlayerId,
    pub room_id: RoomId,

    /// Secret presented by a returning connection to reclaim this slot.
    /// 32 hex chars (128 bits) — unguessable in practice. Issued once
    /// at join and sent only to the owning client.
    pub token: String,

    pub state: SessionState,

    /// Bumped on every transport drop. A grace timer captures the epoch
    /// it was armed for; if the player reconnected (and possibly
    /// dropped again) in the meantime, the stale timer's epoch no
    /// longer matches and it must not evict.
    pub epoch: u64,
}

impl Session {
    /// Returns the attached connection, if any.
    pub fn connection(&self) -> Option<ConnectionId> {
        match self.state {
            SessionState::Connected(conn_id) => Some(conn_id),
            SessionState::Disconnected { .. } => None,
        }
    }
}
