//! Round engine for the crash game.
//!
//! A single actor task drives the round lifecycle (Waiting, Running,
//! Ended, back to Waiting) on a timer, and serializes every player
//! operation against it. The crash point is drawn when the round opens
//! and the crash instant is derived from it, so the flight's outcome is
//! fixed before the first bet lands.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use skylift_broadcast::Broadcaster;
//! use skylift_engine::{EngineConfig, spawn_engine};
//! use skylift_ledger::{InMemoryLedger, Ledger};
//! use skylift_protocol::UserId;
//!
//! # async fn demo() -> Result<(), skylift_engine::GameError> {
//! let ledger = Arc::new(InMemoryLedger::new());
//! ledger.credit(UserId(1), 100.0)?;
//!
//! let broadcaster = Arc::new(Broadcaster::new());
//! let engine = spawn_engine(EngineConfig::default(), ledger, broadcaster);
//!
//! engine.place_bet(UserId(1), 20.0).await?;
//! let win = engine.cash_out(UserId(1)).await?;
//! # let _ = win;
//! # Ok(())
//! # }
//! ```

mod book;
mod config;
mod engine;
mod error;
mod round;

pub use book::{Bet, BetBook};
pub use config::EngineConfig;
pub use engine::{EngineHandle, RoundInfo, spawn_engine};
pub use error::GameError;
pub use round::{Round, RoundStore};
