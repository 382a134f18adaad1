//! Error types for the registry layer.

use keyrace_protocol::RoomId;

/// Errors a client must be told about when a room operation can't
/// proceed. Everything else in the registry no-ops instead.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room has no free player slots.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The room's race already started (or finished) — joins are only
    /// accepted while `waiting`.
    #[error("room {0} has already started")]
    AlreadyStarted(RoomId),
}
