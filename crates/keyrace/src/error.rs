//! Unified error type for the Keyrace server.

use keyrace_protocol::ProtocolError;
use keyrace_registry::RegistryError;
use keyrace_session::SessionError;
use keyrace_transport::TransportError;

/// Top-level error that wraps all layer-specific errors.
///
/// The `#[from]` attributes auto-generate `From` impls, so `?` inside
/// the server converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum KeyraceError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid event).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (bad token, expired grace window).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A registry-level error (room full, not found, already started).
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyrace_protocol::RoomId;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let top: KeyraceError = err.into();
        assert!(matches!(top, KeyraceError::Transport(_)));
        assert!(top.to_string().contains("gone"));
    }

    #[test]
    fn test_local_addr_error_names_the_operation() {
        let io = std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            "socket gone",
        );
        let top: KeyraceError = TransportError::AddrUnavailable(io).into();
        assert!(top.to_string().starts_with("local address unavailable"));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::InvalidToken;
        let top: KeyraceError = err.into();
        assert!(matches!(top, KeyraceError::Session(_)));
    }

    #[test]
    fn test_from_registry_error_preserves_message() {
        let err = RegistryError::RoomFull(RoomId("R1".into()));
        let top: KeyraceError = err.into();
        assert!(matches!(top, KeyraceError::Registry(_)));
        assert_eq!(top.to_string(), "room R1 is full");
    }
}
