//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for domain primitives: assets, quotes, spreads.
//! - [`quotes`] - [`ScriptedQuoteSource`](quotes::ScriptedQuoteSource), a
//!   quote source driven by the test.
//! - [`clock`] - [`ManualClock`](clock::ManualClock) and
//!   [`ImmediateTicker`](clock::ImmediateTicker).
//! - [`config`] - Canonical test configuration.

pub mod clock;
pub mod config;
pub mod domain;
pub mod quotes;
