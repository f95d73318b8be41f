//! Unified error type for the Skylift server.

use skylift_engine::GameError;
use skylift_protocol::ProtocolError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `skylift` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkyliftError {
    /// A socket-level error (bind, accept).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A WebSocket-level error (handshake, send, recv).
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A game-rule violation surfaced outside the request path.
    #[error(transparent)]
    Game(#[from] GameError),
}
