//! Error types for game operations.

use skylift_ledger::LedgerError;
use skylift_protocol::{Phase, RoundId, UserId};

/// Everything that can go wrong with a player operation.
///
/// All variants are expected, recoverable, user-facing conditions; none
/// is process-fatal. The Display message is for operators and logs;
/// clients branch on [`GameError::code`], which is stable across releases
/// and localization.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The engine has not opened a round yet.
    #[error("no active round")]
    NoActiveRound,

    /// The operation is not allowed in the round's current phase:
    /// betting outside Waiting, cashing out outside Running.
    #[error("operation not allowed while round is {0}")]
    InvalidPhase(Phase),

    /// The bet amount is zero, negative, or not a finite number.
    #[error("bet amount {0} is invalid")]
    InvalidAmount(f64),

    /// The stake exceeds the user's balance.
    #[error("insufficient funds: requested {requested:.2}, available {available:.2}")]
    InsufficientFunds { requested: f64, available: f64 },

    /// The user already has a bet in this round.
    #[error("user {0} already has a bet in round {1}")]
    DuplicateBet(UserId, RoundId),

    /// No bet to cash out: none was placed, or it was already cashed.
    #[error("no active bet to cash out")]
    NoActiveBet,

    /// The engine's command channel is closed (shutting down).
    #[error("engine is unavailable")]
    Unavailable,
}

impl GameError {
    /// Stable machine-readable token for the wire. Clients and tests
    /// match on this, never on the Display text.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoActiveRound => "no_active_round",
            Self::InvalidPhase(_) => "invalid_phase",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::DuplicateBet(..) => "duplicate_bet",
            Self::NoActiveBet => "no_active_bet",
            Self::Unavailable => "unavailable",
        }
    }
}

impl From<LedgerError> for GameError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds {
                requested,
                available,
                ..
            } => Self::InsufficientFunds {
                requested,
                available,
            },
            LedgerError::InvalidAmount(amount) => Self::InvalidAmount(amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_snake_case_tokens() {
        assert_eq!(GameError::NoActiveRound.code(), "no_active_round");
        assert_eq!(GameError::InvalidPhase(Phase::Running).code(), "invalid_phase");
        assert_eq!(GameError::NoActiveBet.code(), "no_active_bet");
    }

    #[test]
    fn test_ledger_insufficient_funds_converts() {
        let err: GameError = LedgerError::InsufficientFunds {
            user: UserId(1),
            requested: 50.0,
            available: 20.0,
        }
        .into();
        assert!(matches!(
            err,
            GameError::InsufficientFunds { requested, available }
                if requested == 50.0 && available == 20.0
        ));
    }

    #[test]
    fn test_invalid_phase_message_names_phase() {
        let err = GameError::InvalidPhase(Phase::Ended);
        assert!(err.to_string().contains("ended"));
    }
}
