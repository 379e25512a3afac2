//! Application layer - configuration, the evaluation cycle and its stateful
//! collaborators.

pub mod config;
pub mod engine;
pub mod health;
pub mod manager;
pub mod summary;

pub use config::{Config, LoggingConfig};
pub use engine::{ClosedSummary, CycleReport, Engine};
pub use health::{HealthMonitor, HealthPolicy, HealthSnapshot, HealthTransition};
pub use manager::{PositionLimits, PositionManager};
pub use summary::RunSummary;
