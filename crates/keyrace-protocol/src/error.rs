//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding protocol events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into an event).
    ///
    /// Common causes: malformed JSON, an unknown `type` tag, missing
    /// required fields, or truncated messages.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The event passed deserialization but violates a protocol rule,
    /// e.g. an empty player name where identity is required.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}
