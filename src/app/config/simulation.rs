//! Cycle pacing and run bounds.

use std::time::Duration;

use serde::Deserialize;

/// Simulation loop configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Delay between evaluation cycles.
    pub interval_ms: u64,
    /// Per-quote request timeout.
    pub quote_timeout_ms: u64,
    /// Maximum quote age, and maximum skew between the two quotes of a pair.
    pub staleness_secs: u64,
    /// Re-resolve the asset universe every this many cycles.
    pub universe_refresh_cycles: u64,
    /// Stop after this many cycles; run until interrupted when unset.
    pub max_cycles: Option<u64>,
    /// Seed for the simulated venues; entropy when unset.
    pub seed: Option<u64>,
    /// Close every open hedge at the last seen prices when the run ends.
    pub close_on_exit: bool,
}

impl SimulationConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    #[must_use]
    pub const fn quote_timeout(&self) -> Duration {
        Duration::from_millis(self.quote_timeout_ms)
    }

    #[must_use]
    pub fn staleness(&self) -> chrono::Duration {
        super::secs(self.staleness_secs)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            quote_timeout_ms: 1000,
            staleness_secs: 5,
            universe_refresh_cycles: 20,
            max_cycles: None,
            seed: None,
            close_on_exit: false,
        }
    }
}
