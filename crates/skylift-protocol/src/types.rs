//! Core wire types: identities, round phase, and message frames.
//!
//! The JSON shapes here are the contract with client SDKs: snapshots are
//! internally tagged on `"phase"`, requests and replies on `"type"`. The
//! tests at the bottom pin those shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player account.
///
/// Newtype over `u64`; `#[serde(transparent)]` keeps it a plain number on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A unique identifier for one round of the game.
///
/// Round ids are allocated monotonically by the engine; a higher id always
/// means a later round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub u64);

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a round.
///
/// Transitions are strictly cyclic, with no skipping and no terminal state:
///
/// ```text
/// Waiting → Running → Ended → Waiting (next round)
/// ```
///
/// - **Waiting**: the round is announced, bets are accepted, a countdown
///   runs toward the scheduled start.
/// - **Running**: the coefficient climbs; cashouts are accepted, bets are
///   not.
/// - **Ended**: the round crashed; uncashed stakes are forfeit. Neither
///   bets nor cashouts are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Waiting,
    Running,
    Ended,
}

impl Phase {
    /// Returns `true` if bets may be placed in this phase.
    pub fn accepts_bets(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if cashouts may be requested in this phase.
    pub fn in_flight(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// The phase that follows this one in the cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Waiting => Self::Running,
            Self::Running => Self::Ended,
            Self::Ended => Self::Waiting,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Running => write!(f, "running"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

// ---------------------------------------------------------------------------
// Broadcast snapshots
// ---------------------------------------------------------------------------

/// A live state snapshot pushed to every subscriber.
///
/// One frame shape per phase, tagged on `"phase"`:
///
/// ```json
/// {"phase":"waiting","countdown":4}
/// {"phase":"running","coefficient":1.37}
/// {"phase":"ended","final_coefficient":2.84}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum Snapshot {
    /// Countdown in whole seconds until the flight starts.
    Waiting { countdown: u64 },
    /// The current payout multiplier.
    Running { coefficient: f64 },
    /// The crash point the round ended at.
    Ended { final_coefficient: f64 },
}

impl Snapshot {
    /// The phase this snapshot was taken in.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Waiting { .. } => Phase::Waiting,
            Self::Running { .. } => Phase::Running,
            Self::Ended { .. } => Phase::Ended,
        }
    }
}

// ---------------------------------------------------------------------------
// Request / reply frames
// ---------------------------------------------------------------------------

/// A player operation sent from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Stake `amount` on the current round (Waiting phase only).
    PlaceBet { user_id: UserId, amount: f64 },
    /// Lock in the current coefficient for the user's active bet.
    CashOut { user_id: UserId },
    /// Read the user's balance. Unknown users read 0.0.
    GetBalance { user_id: UserId },
}

impl ClientRequest {
    /// The user this request acts on behalf of.
    pub fn user_id(&self) -> UserId {
        match self {
            Self::PlaceBet { user_id, .. }
            | Self::CashOut { user_id }
            | Self::GetBalance { user_id } => *user_id,
        }
    }
}

/// The server's answer to a [`ClientRequest`].
///
/// `Error.code` is a stable machine-readable token (`"invalid_phase"`,
/// `"insufficient_funds"`, ...); `message` is for humans and may be
/// localized. Clients must branch on `code`, never on `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerReply {
    BetPlaced,
    CashedOut { win: f64 },
    Balance { balance: f64 },
    Error { code: String, message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Pin the JSON shapes the client SDK parses. A serde attribute change
    //! that alters any of these is a wire break.

    use super::*;

    #[test]
    fn test_user_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&UserId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_round_id_display() {
        assert_eq!(RoundId(7).to_string(), "R-7");
        assert_eq!(UserId(3).to_string(), "U-3");
    }

    #[test]
    fn test_phase_cycle_is_strict() {
        assert_eq!(Phase::Waiting.next(), Phase::Running);
        assert_eq!(Phase::Running.next(), Phase::Ended);
        assert_eq!(Phase::Ended.next(), Phase::Waiting);
    }

    #[test]
    fn test_phase_operation_gates() {
        assert!(Phase::Waiting.accepts_bets());
        assert!(!Phase::Running.accepts_bets());
        assert!(!Phase::Ended.accepts_bets());

        assert!(Phase::Running.in_flight());
        assert!(!Phase::Waiting.in_flight());
        assert!(!Phase::Ended.in_flight());
    }

    #[test]
    fn test_phase_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Phase::Waiting).unwrap(), "\"waiting\"");
        assert_eq!(Phase::Running.to_string(), "running");
    }

    #[test]
    fn test_snapshot_waiting_json_shape() {
        let json = serde_json::to_value(&Snapshot::Waiting { countdown: 4 }).unwrap();
        assert_eq!(json["phase"], "waiting");
        assert_eq!(json["countdown"], 4);
    }

    #[test]
    fn test_snapshot_running_json_shape() {
        let json = serde_json::to_value(&Snapshot::Running { coefficient: 1.37 }).unwrap();
        assert_eq!(json["phase"], "running");
        assert_eq!(json["coefficient"], 1.37);
    }

    #[test]
    fn test_snapshot_ended_json_shape() {
        let snap = Snapshot::Ended { final_coefficient: 2.84 };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["phase"], "ended");
        assert_eq!(json["final_coefficient"], 2.84);
        assert_eq!(snap.phase(), Phase::Ended);
    }

    #[test]
    fn test_client_request_place_bet_decodes() {
        let req: ClientRequest =
            serde_json::from_str(r#"{"type":"place_bet","user_id":9,"amount":25.5}"#).unwrap();
        assert_eq!(req, ClientRequest::PlaceBet { user_id: UserId(9), amount: 25.5 });
        assert_eq!(req.user_id(), UserId(9));
    }

    #[test]
    fn test_client_request_cash_out_decodes() {
        let req: ClientRequest =
            serde_json::from_str(r#"{"type":"cash_out","user_id":9}"#).unwrap();
        assert_eq!(req, ClientRequest::CashOut { user_id: UserId(9) });
    }

    #[test]
    fn test_client_request_unknown_type_rejected() {
        let result: Result<ClientRequest, _> =
            serde_json::from_str(r#"{"type":"fly_to_moon","user_id":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_reply_error_json_shape() {
        let reply = ServerReply::Error {
            code: "invalid_phase".into(),
            message: "round is not accepting bets".into(),
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "invalid_phase");
    }

    #[test]
    fn test_server_reply_cashed_out_json_shape() {
        let json = serde_json::to_value(&ServerReply::CashedOut { win: 40.0 }).unwrap();
        assert_eq!(json["type"], "cashed_out");
        assert_eq!(json["win"], 40.0);
    }
}
