//! Error types for the protocol layer.
//!
//! Each Skylift crate defines its own error enum; a `ProtocolError` always
//! means a frame could not be encoded or decoded, never a game-rule or
//! transport problem.

/// Errors that can occur while encoding or decoding wire frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an outgoing frame failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An incoming frame was malformed, truncated, or of the wrong shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but violates protocol rules.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
