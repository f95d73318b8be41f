//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Full timing and payout configuration for the round engine.
///
/// Every phase duration, tick cadence, and the payout curve live here;
/// nothing is hard-coded in the loop. The defaults reproduce the classic
/// table: a 5 s betting window, 1 s countdown ticks, 50 ms flight ticks,
/// a coefficient that climbs 0.1 per second, and crash points drawn from
/// [1.5, 5.0].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long the betting window stays open before the flight starts.
    pub waiting_delay: Duration,
    /// Cadence of countdown broadcasts during Waiting.
    pub waiting_tick: Duration,
    /// Cadence of coefficient broadcasts during Running.
    pub running_tick: Duration,
    /// Coefficient growth in units per second of flight.
    /// `coefficient(t) = 1.0 + elapsed_secs * growth_rate`.
    pub growth_rate: f64,
    /// Lower bound of the uniform crash-point draw. Never below 1.0.
    pub crash_min: f64,
    /// Upper bound of the uniform crash-point draw.
    pub crash_max: f64,
    /// How long the crashed round stays on screen before the next
    /// betting window opens.
    pub ended_cooldown: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            waiting_delay: Duration::from_secs(5),
            waiting_tick: Duration::from_secs(1),
            running_tick: Duration::from_millis(50),
            growth_rate: 0.1,
            crash_min: 1.5,
            crash_max: 5.0,
            ended_cooldown: Duration::from_secs(3),
        }
    }
}

impl EngineConfig {
    /// Shortest tick cadence the engine will run at.
    pub const MIN_TICK: Duration = Duration::from_millis(1);

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically when the engine is spawned. Rules:
    /// - tick cadences floored at [`Self::MIN_TICK`];
    /// - `growth_rate` must be positive, else the default 0.1 is restored;
    /// - `crash_min` floored at 1.0; `crash_max` floored at `crash_min`.
    pub fn validated(mut self) -> Self {
        if self.waiting_tick < Self::MIN_TICK {
            warn!(tick = ?self.waiting_tick, "waiting_tick too short, clamping");
            self.waiting_tick = Self::MIN_TICK;
        }
        if self.running_tick < Self::MIN_TICK {
            warn!(tick = ?self.running_tick, "running_tick too short, clamping");
            self.running_tick = Self::MIN_TICK;
        }
        if !self.growth_rate.is_finite() || self.growth_rate <= 0.0 {
            warn!(rate = self.growth_rate, "growth_rate not positive, using default");
            self.growth_rate = 0.1;
        }
        if !self.crash_min.is_finite() || self.crash_min < 1.0 {
            warn!(min = self.crash_min, "crash_min below 1.0, clamping");
            self.crash_min = 1.0;
        }
        if !self.crash_max.is_finite() || self.crash_max < self.crash_min {
            warn!(max = self.crash_max, min = self.crash_min, "crash_max below crash_min, clamping");
            self.crash_max = self.crash_min;
        }
        self
    }
}
