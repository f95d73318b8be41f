//! Rounds and the round store.
//!
//! A [`Round`] captures everything decided about one game cycle: when the
//! flight starts, the predetermined crash point, and the growth rate that
//! turns elapsed flight time into a coefficient. [`Round::coefficient_at`]
//! is the single source of truth for "current coefficient": the broadcast
//! tick and cashout pricing both call it, so the two can never drift apart
//! under scheduling jitter.

use std::time::Duration;

use skylift_protocol::{Phase, RoundId};
use tokio::time::Instant;

/// One cycle of the game: waiting window, flight, crash.
///
/// Created when the betting window opens; the phase and `actual_start` are
/// written only by the engine actor. Once `Ended`, a round is immutable
/// history.
#[derive(Debug, Clone)]
pub struct Round {
    pub id: RoundId,
    pub phase: Phase,
    /// When the flight is scheduled to begin.
    pub scheduled_start: Instant,
    /// The coefficient this round will crash at. Drawn at creation,
    /// rounded to 2 decimals, never changed afterwards.
    pub crash_point: f64,
    /// Coefficient growth per second, frozen from the config at creation.
    pub growth_rate: f64,
    /// When the flight actually began. `None` until Running.
    pub actual_start: Option<Instant>,
}

impl Round {
    pub(crate) fn new(
        id: RoundId,
        scheduled_start: Instant,
        crash_point: f64,
        growth_rate: f64,
    ) -> Self {
        Self {
            id,
            phase: Phase::Waiting,
            scheduled_start,
            crash_point,
            growth_rate,
            actual_start: None,
        }
    }

    /// Whole seconds until the scheduled start, rounded up so the
    /// countdown reads 5..1 instead of 4..0.
    pub fn countdown(&self, now: Instant) -> u64 {
        let remaining = self.scheduled_start.saturating_duration_since(now);
        remaining.as_secs_f64().ceil() as u64
    }

    /// Marks the flight as started.
    pub(crate) fn start_flight(&mut self, now: Instant) {
        debug_assert_eq!(self.phase, Phase::Waiting);
        self.phase = Phase::Running;
        self.actual_start = Some(now);
    }

    /// Marks the round as crashed.
    pub(crate) fn end(&mut self) {
        debug_assert_eq!(self.phase, Phase::Running);
        self.phase = Phase::Ended;
    }

    /// The coefficient at instant `now`:
    /// `1.0 + elapsed_flight_secs * growth_rate`, clamped to the crash
    /// point. Before the flight starts this is 1.0.
    pub fn coefficient_at(&self, now: Instant) -> f64 {
        match self.actual_start {
            Some(start) => {
                let elapsed = now.saturating_duration_since(start).as_secs_f64();
                (1.0 + elapsed * self.growth_rate).min(self.crash_point)
            }
            None => 1.0,
        }
    }

    /// The instant the coefficient reaches the crash point. `None` until
    /// the flight has started.
    pub fn crash_instant(&self) -> Option<Instant> {
        self.actual_start.map(|start| {
            start + Duration::from_secs_f64((self.crash_point - 1.0) / self.growth_rate)
        })
    }

    /// Whether the crash instant has passed by `now`.
    ///
    /// The phase field flips on the engine's next tick; this is the check
    /// that keeps a racing cashout from pricing after the crash.
    pub fn crashed_by(&self, now: Instant) -> bool {
        matches!(self.crash_instant(), Some(crash) if now >= crash)
    }
}

/// Owner of the current round and the append-only history of ended ones.
///
/// There is at most one current round; it stays current through its Ended
/// cooldown and is retired to history when the next round opens. Rounds
/// are never deleted.
#[derive(Debug)]
pub struct RoundStore {
    next_id: u64,
    current: Option<Round>,
    history: Vec<Round>,
}

impl RoundStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            current: None,
            history: Vec::new(),
        }
    }

    /// Opens a new round in Waiting, retiring any previous (ended) round
    /// to history. Returns the new round's id.
    pub fn open_round(
        &mut self,
        scheduled_start: Instant,
        crash_point: f64,
        growth_rate: f64,
    ) -> RoundId {
        if let Some(previous) = self.current.take() {
            debug_assert_eq!(previous.phase, Phase::Ended);
            self.history.push(previous);
        }
        let id = RoundId(self.next_id);
        self.next_id += 1;
        self.current = Some(Round::new(id, scheduled_start, crash_point, growth_rate));
        id
    }

    pub fn current(&self) -> Option<&Round> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Round> {
        self.current.as_mut()
    }

    /// Ended rounds, oldest first.
    pub fn history(&self) -> &[Round] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_at(now: Instant) -> Round {
        Round::new(RoundId(1), now + Duration::from_secs(5), 3.0, 0.1)
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_rounds_up() {
        let now = Instant::now();
        let round = round_at(now);
        assert_eq!(round.countdown(now), 5);
        assert_eq!(round.countdown(now + Duration::from_millis(4_200)), 1);
        assert_eq!(round.countdown(now + Duration::from_secs(7)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_coefficient_is_one_before_flight() {
        let now = Instant::now();
        let round = round_at(now);
        assert_eq!(round.coefficient_at(now + Duration::from_secs(60)), 1.0);
        assert_eq!(round.crash_instant(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_coefficient_grows_linearly_and_clamps() {
        let now = Instant::now();
        let mut round = round_at(now);
        round.start_flight(now);

        assert_eq!(round.coefficient_at(now), 1.0);
        assert_eq!(round.coefficient_at(now + Duration::from_secs(10)), 2.0);
        // Clamped at the crash point from 20 s onward.
        assert_eq!(round.coefficient_at(now + Duration::from_secs(30)), 3.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_crash_instant_matches_formula_inverse() {
        let now = Instant::now();
        let mut round = round_at(now);
        round.start_flight(now);

        // (3.0 - 1.0) / 0.1 = 20 s of flight.
        let crash = round.crash_instant().unwrap();
        assert_eq!(crash, now + Duration::from_secs(20));
        assert!(!round.crashed_by(now + Duration::from_secs(19)));
        assert!(round.crashed_by(crash));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_ids_are_monotonic_and_history_appends() {
        let now = Instant::now();
        let mut store = RoundStore::new();

        let first = store.open_round(now, 2.0, 0.1);
        assert_eq!(first, RoundId(1));
        {
            let round = store.current_mut().unwrap();
            round.start_flight(now);
            round.end();
        }

        let second = store.open_round(now, 2.5, 0.1);
        assert_eq!(second, RoundId(2));
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.history()[0].id, first);
        assert_eq!(store.current().unwrap().id, second);
    }
}
