//! Codec trait and implementations for serializing protocol events.
//!
//! The gateway doesn't care how events become bytes — it programs
//! against the [`Codec`] trait. [`JsonCodec`] is the default (and what
//! the browser client speaks); a binary codec could be slotted in later
//! without touching the gateway.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Converts protocol types to and from wire bytes.
///
/// `Send + Sync + 'static` because the codec is shared across every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or
    /// don't match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable, inspectable in browser DevTools, and the format the
/// web client already uses. Behind the `json` feature (default on).
///
/// ## Example
///
/// ```rust
/// use keyrace_protocol::{Codec, JsonCodec, ClientEvent};
///
/// let codec = JsonCodec;
/// let ev = ClientEvent::RoomList;
///
/// let bytes = codec.encode(&ev).unwrap();
/// let decoded: ClientEvent = codec.decode(&bytes).unwrap();
/// assert_eq!(ev, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::ServerEvent;

    #[test]
    fn test_json_codec_round_trips_server_event() {
        let codec = JsonCodec;
        let ev = ServerEvent::RoomLeft;

        let bytes = codec.encode(&ev).unwrap();
        let decoded: ServerEvent = codec.decode(&bytes).unwrap();

        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_json_codec_decode_garbage_returns_error() {
        let codec = JsonCodec;
        let result: Result<ServerEvent, _> = codec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
