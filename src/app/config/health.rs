//! Failure window and circuit breaker thresholds.

use serde::Deserialize;

/// Health monitor configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Rolling window for failure counts, in seconds.
    pub window_secs: u64,
    /// Transient failures within the window that degrade a venue.
    pub max_failures: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_failures: 5,
        }
    }
}
