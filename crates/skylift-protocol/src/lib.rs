//! Wire protocol for the Skylift crash-game server.
//!
//! Everything a client sees on the wire is defined here: identity newtypes,
//! the round [`Phase`], the broadcast [`Snapshot`] frames, and the
//! request/reply frames for the three player operations. The [`Codec`]
//! trait abstracts how frames become bytes; [`JsonCodec`] is the default.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientRequest, Phase, RoundId, ServerReply, Snapshot, UserId};
