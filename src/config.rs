//! Configuration (C10).
//!
//! A plain struct with a `Default` impl and a builder-ish set of setters,
//! the same shape as the teacher's `RiskConfig`/`StrategyParams` — no
//! serde, since the teacher never serializes its own config structs either
//! (they're constructed in-process by whatever assembles a run).

use crate::clock::Timestamp;

/// Top-level knobs for constructing and driving a [`crate::bus::Bus`].
#[derive(Debug, Clone, PartialEq)]
pub struct BusConfig {
    /// Logical clock origin. Defaults to `Timestamp::ZERO`.
    pub origin: Timestamp,
    /// Real-time pacer speed factor. `f64::INFINITY` (the default) means
    /// run as fast as possible with no wall-clock pacing at all.
    pub pacer_speed_factor: f64,
    /// Upper bound on steps a single `run`/`pace` call will execute before
    /// giving up, as a guard against runaway self-scheduling loops.
    pub max_steps_per_run: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            origin: Timestamp::ZERO,
            pacer_speed_factor: f64::INFINITY,
            max_steps_per_run: 1_000_000,
        }
    }
}

impl BusConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin(mut self, origin: Timestamp) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_pacer_speed_factor(mut self, speed_factor: f64) -> Self {
        self.pacer_speed_factor = speed_factor;
        self
    }

    pub fn with_max_steps_per_run(mut self, max_steps: usize) -> Self {
        self.max_steps_per_run = max_steps;
        self
    }

    /// Builds a [`crate::bus::Bus`] seeded with this config's origin.
    pub fn build_bus(&self) -> crate::bus::Bus {
        crate::bus::Bus::new(self.origin)
    }
}
