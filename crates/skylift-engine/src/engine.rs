//! The round engine actor: an isolated Tokio task that owns one table.
//!
//! The actor is the single logical owner of the round store, the bet book,
//! and the ledger handle. Every player operation arrives as a command on
//! an mpsc channel and is processed serially between timer ticks, so phase
//! reads, bet mutations, and balance mutations are linearized. There is
//! no way for a cashout to interleave with a phase transition or for two
//! operations on the same user to race.

use std::sync::Arc;

use rand::Rng;
use skylift_broadcast::Broadcaster;
use skylift_ledger::{Ledger, round2};
use skylift_protocol::{Phase, RoundId, Snapshot, UserId};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};

use crate::{BetBook, EngineConfig, GameError, RoundStore};

/// Command channel depth. Senders wait when the actor falls this far
/// behind (bounded channel backpressure).
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Commands sent to the engine actor through its channel.
enum EngineCommand {
    PlaceBet {
        user: UserId,
        amount: f64,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    CashOut {
        user: UserId,
        reply: oneshot::Sender<Result<f64, GameError>>,
    },
    Balance {
        user: UserId,
        reply: oneshot::Sender<f64>,
    },
    RoundInfo {
        reply: oneshot::Sender<Option<RoundInfo>>,
    },
    Shutdown,
}

/// A snapshot of the current round as seen at command-processing time.
#[derive(Debug, Clone)]
pub struct RoundInfo {
    pub id: RoundId,
    pub phase: Phase,
    pub crash_point: f64,
    /// Live coefficient (1.0 outside Running).
    pub coefficient: f64,
}

/// Handle to a running engine actor. Cheap to clone.
#[derive(Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    /// Stakes `amount` on the current round for `user`.
    pub async fn place_bet(&self, user: UserId, amount: f64) -> Result<(), GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(EngineCommand::PlaceBet {
                user,
                amount,
                reply: reply_tx,
            })
            .await
            .map_err(|_| GameError::Unavailable)?;
        reply_rx.await.map_err(|_| GameError::Unavailable)?
    }

    /// Cashes out `user`'s active bet at the current coefficient.
    /// Returns the winnings credited.
    pub async fn cash_out(&self, user: UserId) -> Result<f64, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(EngineCommand::CashOut {
                user,
                reply: reply_tx,
            })
            .await
            .map_err(|_| GameError::Unavailable)?;
        reply_rx.await.map_err(|_| GameError::Unavailable)?
    }

    /// Reads `user`'s balance. Unknown users read 0.0.
    pub async fn balance(&self, user: UserId) -> Result<f64, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(EngineCommand::Balance {
                user,
                reply: reply_tx,
            })
            .await
            .map_err(|_| GameError::Unavailable)?;
        reply_rx.await.map_err(|_| GameError::Unavailable)
    }

    /// The current round's id, phase, crash point, and live coefficient.
    pub async fn round_info(&self) -> Result<Option<RoundInfo>, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(EngineCommand::RoundInfo { reply: reply_tx })
            .await
            .map_err(|_| GameError::Unavailable)?;
        reply_rx.await.map_err(|_| GameError::Unavailable)
    }

    /// Tells the engine to stop after the current command.
    pub async fn shutdown(&self) -> Result<(), GameError> {
        self.sender
            .send(EngineCommand::Shutdown)
            .await
            .map_err(|_| GameError::Unavailable)
    }
}

/// The engine actor state. Runs inside a Tokio task.
struct EngineActor<L: Ledger> {
    config: EngineConfig,
    store: RoundStore,
    book: BetBook,
    ledger: Arc<L>,
    broadcaster: Arc<Broadcaster<Snapshot>>,
    receiver: mpsc::Receiver<EngineCommand>,
    /// When the next phase tick is due.
    next_wake: Instant,
}

impl<L: Ledger> EngineActor<L> {
    /// Runs the actor loop: commands interleaved with phase ticks, until
    /// shutdown or until every handle is dropped.
    async fn run(mut self) {
        tracing::info!("round engine started");
        self.open_waiting_round(Instant::now());

        loop {
            tokio::select! {
                maybe_cmd = self.receiver.recv() => match maybe_cmd {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                _ = time::sleep_until(self.next_wake) => self.advance(),
            }
        }

        tracing::info!("round engine stopped");
    }

    fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::PlaceBet {
                user,
                amount,
                reply,
            } => {
                let _ = reply.send(self.place_bet(user, amount));
            }
            EngineCommand::CashOut { user, reply } => {
                let _ = reply.send(self.cash_out(user));
            }
            EngineCommand::Balance { user, reply } => {
                let _ = reply.send(self.ledger.balance(user));
            }
            EngineCommand::RoundInfo { reply } => {
                let _ = reply.send(self.round_info());
            }
            // Handled in run() before dispatch.
            EngineCommand::Shutdown => {}
        }
    }

    // -- Phase machine ----------------------------------------------------

    /// Advances the state machine when a tick deadline fires.
    fn advance(&mut self) {
        let now = Instant::now();
        let Some(round) = self.store.current() else {
            self.open_waiting_round(now);
            return;
        };

        match round.phase {
            Phase::Waiting if now >= round.scheduled_start => self.start_flight(now),
            Phase::Waiting => {
                let countdown = round.countdown(now);
                let scheduled_start = round.scheduled_start;
                self.broadcaster.publish(&Snapshot::Waiting { countdown });
                self.next_wake = (now + self.config.waiting_tick).min(scheduled_start);
            }
            Phase::Running if round.crashed_by(now) => self.end_round(now),
            Phase::Running => {
                let coefficient = round2(round.coefficient_at(now));
                let crash_at = round.crash_instant().unwrap_or(now);
                self.broadcaster.publish(&Snapshot::Running { coefficient });
                self.next_wake = (now + self.config.running_tick).min(crash_at);
            }
            // Cooldown elapsed: open the next betting window.
            Phase::Ended => self.open_waiting_round(now),
        }
    }

    /// Opens a fresh round in Waiting and announces it.
    fn open_waiting_round(&mut self, now: Instant) {
        let crash_point =
            round2(rand::rng().random_range(self.config.crash_min..=self.config.crash_max));
        let scheduled_start = now + self.config.waiting_delay;
        let id = self
            .store
            .open_round(scheduled_start, crash_point, self.config.growth_rate);

        tracing::info!(
            round_id = %id,
            crash_point,
            delay_s = self.config.waiting_delay.as_secs_f64(),
            "betting window open"
        );

        let countdown = self
            .store
            .current()
            .map(|round| round.countdown(now))
            .unwrap_or(0);
        self.broadcaster.publish(&Snapshot::Waiting { countdown });
        self.next_wake = (now + self.config.waiting_tick).min(scheduled_start);
    }

    /// Transitions Waiting → Running at the scheduled start.
    fn start_flight(&mut self, now: Instant) {
        let Some(round) = self.store.current_mut() else {
            return;
        };
        round.start_flight(now);
        let id = round.id;
        let crash_at = round.crash_instant().unwrap_or(now);

        tracing::info!(round_id = %id, "flight started");

        self.broadcaster.publish(&Snapshot::Running { coefficient: 1.0 });
        self.next_wake = (now + self.config.running_tick).min(crash_at);
    }

    /// Transitions Running → Ended at the crash instant. The round stays
    /// current (rejecting operations as `InvalidPhase`) through the
    /// cooldown; it is retired to history when the next round opens.
    fn end_round(&mut self, now: Instant) {
        let Some(round) = self.store.current_mut() else {
            return;
        };
        round.end();
        let final_coefficient = round.crash_point;

        tracing::info!(round_id = %round.id, final_coefficient, "round crashed");

        self.broadcaster.publish(&Snapshot::Ended { final_coefficient });
        self.next_wake = now + self.config.ended_cooldown;
    }

    // -- Player operations -------------------------------------------------

    fn place_bet(&mut self, user: UserId, amount: f64) -> Result<(), GameError> {
        let round = self.store.current().ok_or(GameError::NoActiveRound)?;
        if !round.phase.accepts_bets() {
            return Err(GameError::InvalidPhase(round.phase));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(GameError::InvalidAmount(amount));
        }
        let round_id = round.id;
        if self.book.has_bet(round_id, user) {
            return Err(GameError::DuplicateBet(user, round_id));
        }

        // Validation is complete; the debit is the single fallible
        // mutation, so a failure leaves no partial state behind.
        self.ledger.debit(user, amount)?;
        self.book.record(round_id, user, amount);

        tracing::info!(%user, round_id = %round_id, amount, "bet placed");
        Ok(())
    }

    fn cash_out(&mut self, user: UserId) -> Result<f64, GameError> {
        let now = Instant::now();
        let round = self.store.current().ok_or(GameError::NoActiveRound)?;
        if !round.phase.in_flight() {
            return Err(GameError::InvalidPhase(round.phase));
        }
        // The phase field flips on the next tick; a cashout arriving
        // after the crash instant must not price against the stale
        // Running read.
        if round.crashed_by(now) {
            return Err(GameError::InvalidPhase(Phase::Ended));
        }

        let round_id = round.id;
        let coefficient = round2(round.coefficient_at(now));
        let stake = self
            .book
            .active_stake(round_id, user)
            .ok_or(GameError::NoActiveBet)?;

        let win = round2(stake * coefficient);
        self.ledger.credit(user, win)?;
        self.book.mark_cashed(round_id, user, coefficient);

        tracing::info!(%user, round_id = %round_id, coefficient, win, "cashed out");
        Ok(win)
    }

    fn round_info(&self) -> Option<RoundInfo> {
        let now = Instant::now();
        self.store.current().map(|round| RoundInfo {
            id: round.id,
            phase: round.phase,
            crash_point: round.crash_point,
            coefficient: round2(round.coefficient_at(now)),
        })
    }
}

/// Spawns the engine actor task and returns a handle to it.
///
/// The config is validated first; out-of-range values are clamped with a
/// warning rather than rejected.
pub fn spawn_engine<L: Ledger>(
    config: EngineConfig,
    ledger: Arc<L>,
    broadcaster: Arc<Broadcaster<Snapshot>>,
) -> EngineHandle {
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);

    let actor = EngineActor {
        config: config.validated(),
        store: RoundStore::new(),
        book: BetBook::new(),
        ledger,
        broadcaster,
        receiver: rx,
        next_wake: Instant::now(),
    };

    tokio::spawn(actor.run());

    EngineHandle { sender: tx }
}
