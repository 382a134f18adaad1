//! The session manager: every connection's (player, room) association.
//!
//! This is the gateway's lookup table. It answers "which player and
//! room does this connection speak for?", issues reconnect tokens, and
//! tracks the disconnect grace window.
//!
//! # Concurrency note
//!
//! `SessionManager` is NOT thread-safe by itself — plain `HashMap`s,
//! owned by the server and serialized behind one lock at a higher
//! level, alongside the room registry.

use std::collections::HashMap;
use std::time::Instant;

use keyrace_protocol::{PlayerId, RoomId};
use keyrace_transport::ConnectionId;
use rand::Rng;

use crate::{Session, SessionConfig, SessionError, SessionState};

/// Handed to the grace timer when a connection drops: everything the
/// reaper needs to decide, later, whether eviction still applies.
#[derive(Debug, Clone)]
pub struct DisconnectTicket {
    pub player_id: PlayerId,
    pub room_id: RoomId,
    /// The disconnect epoch this ticket belongs to. Stale tickets
    /// (player resumed, possibly dropped again) fail the epoch check.
    pub epoch: u64,
}

/// Tracks all active sessions, keyed three ways: by player, by
/// reconnect token, and by live connection.
pub struct SessionManager {
    sessions: HashMap<PlayerId, Session>,

    /// Token → player index, kept in sync with `sessions` so a resume
    /// doesn't scan.
    tokens: HashMap<String, PlayerId>,

    /// Live connection → player index. Entries exist only while a
    /// transport connection is attached.
    connections: HashMap<ConnectionId, PlayerId>,

    config: SessionConfig,
}

impl SessionManager {
    /// Creates a new, empty session manager with the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            tokens: HashMap::new(),
            connections: HashMap::new(),
            config,
        }
    }

    /// Associates a connection with a freshly joined (player, room)
    /// and issues the reconnect token.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyBound`] if the connection already
    /// speaks for a player — one channel, one active association.
    pub fn bind(
        &mut self,
        conn_id: ConnectionId,
        player_id: PlayerId,
        room_id: RoomId,
    ) -> Result<&Session, SessionError> {
        if self.connections.contains_key(&conn_id) {
            return Err(SessionError::AlreadyBound(conn_id));
        }

        let token = generate_token();
        let session = Session {
            player_id: player_id.clone(),
            room_id,
            token: token.clone(),
            state: SessionState::Connected(conn_id),
            epoch: 0,
        };

        self.tokens.insert(token, player_id.clone());
        self.connections.insert(conn_id, player_id.clone());
        self.sessions.insert(player_id.clone(), session);

        tracing::info!(%conn_id, %player_id, "session bound");
        Ok(self.sessions.get(&player_id).expect("just inserted"))
    }

    /// The (player, room) a connection speaks for, if any.
    pub fn identity(&self, conn_id: ConnectionId) -> Option<(PlayerId, RoomId)> {
        let player_id = self.connections.get(&conn_id)?;
        let session = self.sessions.get(player_id)?;
        Some((session.player_id.clone(), session.room_id.clone()))
    }

    /// Looks up a session by player id.
    pub fn get(&self, player_id: &PlayerId) -> Option<&Session> {
        self.sessions.get(player_id)
    }

    /// Drops a connection's session entirely (explicit leave). The
    /// token dies with it. Returns the association that was removed,
    /// or `None` if the connection was bound to nothing.
    pub fn unbind(&mut self, conn_id: ConnectionId) -> Option<(PlayerId, RoomId)> {
        let player_id = self.connections.remove(&conn_id)?;
        let session = self.sessions.remove(&player_id)?;
        self.tokens.remove(&session.token);
        tracing::info!(%conn_id, %player_id, "session unbound");
        Some((session.player_id, session.room_id))
    }

    /// Marks a connection's session as disconnected and starts the
    /// grace window. The room slot is NOT freed — only the eventual
    /// [`evict`](Self::evict) does that. Returns the ticket the grace
    /// timer should carry, or `None` if the connection was bound to
    /// nothing.
    pub fn disconnect(&mut self, conn_id: ConnectionId) -> Option<DisconnectTicket> {
        let player_id = self.connections.remove(&conn_id)?;
        let session = self.sessions.get_mut(&player_id)?;

        session.epoch += 1;
        session.state = SessionState::Disconnected {
            since: Instant::now(),
        };

        tracing::info!(%conn_id, %player_id, epoch = session.epoch, "grace period started");
        Some(DisconnectTicket {
            player_id: session.player_id.clone(),
            room_id: session.room_id.clone(),
            epoch: session.epoch,
        })
    }

    /// Reattaches a returning connection to its still-held slot.
    ///
    /// # Errors
    /// - [`SessionError::InvalidToken`] — token not recognized
    /// - [`SessionError::AlreadyConnected`] — the slot has a live
    ///   connection (e.g. a second tab presenting the same token)
    /// - [`SessionError::SessionExpired`] — the grace window elapsed;
    ///   the reaper owns this session now
    pub fn resume(
        &mut self,
        token: &str,
        conn_id: ConnectionId,
    ) -> Result<&Session, SessionError> {
        let player_id = self
            .tokens
            .get(token)
            .cloned()
            .ok_or(SessionError::InvalidToken)?;
        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::InvalidToken)?;

        match session.state {
            SessionState::Connected(_) => {
                Err(SessionError::AlreadyConnected(player_id))
            }
            SessionState::Disconnected { since } => {
                if since.elapsed() > self.config.reconnect_grace {
                    return Err(SessionError::SessionExpired(player_id));
                }
                session.state = SessionState::Connected(conn_id);
                self.connections.insert(conn_id, player_id.clone());
                tracing::info!(%conn_id, %player_id, "session resumed");
                Ok(self.sessions.get(&player_id).expect("just modified"))
            }
        }
    }

    /// Removes a session whose grace window expired without a resume.
    ///
    /// Called by the reaper when the grace timer fires. Returns the
    /// association to tear down, or `None` if eviction no longer
    /// applies: the player resumed, the ticket's epoch is stale, or the
    /// session is already gone. A no-op result means the timer was
    /// superseded and must not touch room state.
    pub fn evict(&mut self, ticket: &DisconnectTicket) -> Option<(PlayerId, RoomId)> {
        let session = self.sessions.get(&ticket.player_id)?;

        let still_disconnected =
            matches!(session.state, SessionState::Disconnected { .. });
        if !still_disconnected || session.epoch != ticket.epoch {
            return None;
        }

        let session = self
            .sessions
            .remove(&ticket.player_id)
            .expect("checked above");
        self.tokens.remove(&session.token);
        tracing::info!(
            player_id = %ticket.player_id,
            room_id = %ticket.room_id,
            "session evicted (grace period elapsed)"
        );
        Some((session.player_id, session.room_id))
    }

    /// The configured grace window — what the reaper sleeps before
    /// calling [`evict`](Self::evict).
    pub fn reconnect_grace(&self) -> std::time::Duration {
        self.config.reconnect_grace
    }

    /// Returns the number of tracked sessions (connected or in grace).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Generates a random 32-character hex token (128 bits of entropy).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
