//! Hedgelord - cross-venue spread arbitrage simulator.
//!
//! Two simulated venues quote the same assets. Every cycle the engine pulls a
//! quote pair per asset, evaluates the spread in both directions, opens at
//! most one hedge (short the expensive leg, long the cheap leg) and closes
//! hedges whose spread converged, widened past the stop loss, or were held
//! too long. Balances live in a simulated ledger; failures feed a per-venue
//! circuit breaker.
//!
//! # Modules
//!
//! - [`domain`] - Pure types and rules: quotes, spreads, selection, hedge
//!   positions, the ledger and error classification
//! - [`port`] - Seams to the outside: quote sources, clocks, event sinks
//! - [`adapter`] - Simulated venues and channel-backed event sinks
//! - [`app`] - Configuration, health monitor, position manager and the
//!   cycle engine
//! - [`cli`] - The `hedgelord` command line
//! - [`error`] - Crate-level error types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use hedgelord::adapter::SimulatedVenue;
//! use hedgelord::app::{Config, Engine};
//! use hedgelord::domain::VenueSide;
//! use hedgelord::port::{Clock, NotifierRegistry, SystemClock};
//!
//! # async fn demo() {
//! let config = Config::default();
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//! let a = SimulatedVenue::new(VenueSide::A, &config.venues.a, Arc::clone(&clock), Some(1));
//! let b = SimulatedVenue::new(VenueSide::B, &config.venues.b, Arc::clone(&clock), Some(2));
//! let mut engine = Engine::new(&config, Arc::new(a), Arc::new(b), clock, NotifierRegistry::new());
//! let report = engine.run_cycle().await;
//! println!("evaluated {} assets", report.evaluated);
//! # }
//! ```

pub mod adapter;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
