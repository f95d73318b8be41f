//! Error types for the ledger layer.

use skylift_protocol::UserId;

/// Errors that can occur during a balance mutation.
///
/// Reads never fail: an unknown user simply has balance 0.0.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A debit would have taken the balance below zero.
    #[error("user {user} has {available:.2}, needs {requested:.2}")]
    InsufficientFunds {
        user: UserId,
        requested: f64,
        available: f64,
    },

    /// The amount is zero, negative, NaN, or infinite.
    #[error("amount {0} is not a positive finite number")]
    InvalidAmount(f64),
}
