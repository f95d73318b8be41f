//! The bet book: who staked what, per round.
//!
//! The book enforces one structural invariant, at most one bet per
//! (user, round), and records the single permitted mutation, the cashout
//! flip. Phase rules and money movement live in the engine; the book only
//! tracks bets. Bets are kept per round and never deleted.

use std::collections::HashMap;

use skylift_protocol::{RoundId, UserId};

/// A single player's stake on a single round.
#[derive(Debug, Clone)]
pub struct Bet {
    pub user_id: UserId,
    pub round_id: RoundId,
    pub amount: f64,
    pub cashed_out: bool,
    /// The multiplier the player locked in. Meaningful only once
    /// `cashed_out` is set; 1.0 until then.
    pub coefficient: f64,
}

/// Per-round mapping of user to bet.
#[derive(Debug, Default)]
pub struct BetBook {
    rounds: HashMap<RoundId, HashMap<UserId, Bet>>,
}

impl BetBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the user already has a bet (cashed out or not) in the round.
    pub fn has_bet(&self, round: RoundId, user: UserId) -> bool {
        self.rounds
            .get(&round)
            .is_some_and(|bets| bets.contains_key(&user))
    }

    /// Records a new bet. The caller must have checked [`Self::has_bet`];
    /// recording a duplicate is a logic error.
    pub fn record(&mut self, round: RoundId, user: UserId, amount: f64) {
        let bets = self.rounds.entry(round).or_default();
        debug_assert!(!bets.contains_key(&user), "duplicate bet slipped past validation");
        bets.insert(
            user,
            Bet {
                user_id: user,
                round_id: round,
                amount,
                cashed_out: false,
                coefficient: 1.0,
            },
        );
    }

    /// The stake of the user's not-yet-cashed bet in the round, if any.
    pub fn active_stake(&self, round: RoundId, user: UserId) -> Option<f64> {
        self.rounds
            .get(&round)
            .and_then(|bets| bets.get(&user))
            .filter(|bet| !bet.cashed_out)
            .map(|bet| bet.amount)
    }

    /// Flips the user's bet to cashed-out at `coefficient`. Must follow a
    /// successful [`Self::active_stake`] read within the same engine
    /// command; the bet is guaranteed present and uncashed.
    pub fn mark_cashed(&mut self, round: RoundId, user: UserId, coefficient: f64) {
        if let Some(bet) = self.rounds.get_mut(&round).and_then(|bets| bets.get_mut(&user)) {
            debug_assert!(!bet.cashed_out);
            bet.cashed_out = true;
            bet.coefficient = coefficient;
        } else {
            debug_assert!(false, "mark_cashed without an active bet");
        }
    }

    /// All bets recorded for a round, in no particular order.
    pub fn bets_for(&self, round: RoundId) -> impl Iterator<Item = &Bet> {
        self.rounds.get(&round).into_iter().flat_map(|bets| bets.values())
    }
}
