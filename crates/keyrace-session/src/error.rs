//! Error types for the session layer.

use keyrace_protocol::PlayerId;
use keyrace_transport::ConnectionId;

/// Errors that can occur while managing connection sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection already speaks for a player. One channel carries
    /// at most one active (player, room) association.
    #[error("connection {0} is already in a room")]
    AlreadyBound(ConnectionId),

    /// The reconnect token doesn't match anything the server issued —
    /// stale, mistyped, or forged.
    #[error("invalid session token")]
    InvalidToken,

    /// The session's slot already has a live connection attached.
    #[error("player {0} is already connected")]
    AlreadyConnected(PlayerId),

    /// The grace window elapsed before the resume arrived.
    #[error("session expired for player {0}")]
    SessionExpired(PlayerId),
}
