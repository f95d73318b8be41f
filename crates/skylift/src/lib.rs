//! # Skylift
//!
//! A WebSocket crash-game server.
//!
//! One table runs one round engine: a betting window counts down, the
//! coefficient climbs from 1.0 until the round crashes, and every
//! connected client receives the same snapshot feed. Clients send JSON
//! requests to bet, cash out, and read balances.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use skylift::SkyliftServer;
//!
//! # async fn demo() -> Result<(), skylift::SkyliftError> {
//! let server = SkyliftServer::builder().bind("0.0.0.0:8080").build().await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::SkyliftError;
pub use server::{SkyliftServer, SkyliftServerBuilder};

// Re-export the pieces callers need to configure a table and talk to it.
pub use skylift_engine::{EngineConfig, EngineHandle, GameError};
pub use skylift_ledger::{InMemoryLedger, Ledger};
pub use skylift_protocol::{ClientRequest, Phase, RoundId, ServerReply, Snapshot, UserId};
