//! Codec trait and implementations for frame serialization.
//!
//! The transport layer doesn't care how frames are serialized; it needs
//! something implementing [`Codec`]. [`JsonCodec`] is the default; a binary
//! codec can be swapped in without touching any other layer.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust frame types to bytes and decodes bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a frame into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a frame.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable on the wire, which is what browser clients expect over
/// WebSocket text frames.
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
    use crate::Snapshot;

    #[test]
    fn test_json_codec_round_trip() {
        let codec = JsonCodec;
        let snap = Snapshot::Running { coefficient: 2.0 };
        let bytes = codec.encode(&snap).unwrap();
        let decoded: Snapshot = codec.decode(&bytes).unwrap();
        assert_eq!(snap, decoded);
    }

    #[test]
    fn test_json_codec_decode_garbage_fails() {
        let codec = JsonCodec;
        let result: Result<Snapshot, _> = codec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
