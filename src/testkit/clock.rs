//! Controllable time for tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::port::{Clock, Ticker};

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// A ticker that never waits.
///
/// Optionally advances a [`ManualClock`] on every tick after the first, so a
/// bounded run sees time pass between cycles.
#[derive(Default)]
pub struct ImmediateTicker {
    clock: Option<(Arc<ManualClock>, Duration)>,
    ticks: Arc<AtomicU64>,
}

impl ImmediateTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `clock` by `step` on every tick but the first.
    pub fn advancing(clock: Arc<ManualClock>, step: Duration) -> Self {
        Self {
            clock: Some((clock, step)),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared tick counter.
    pub fn ticks(&self) -> Arc<AtomicU64> {
        self.ticks.clone()
    }
}

#[async_trait]
impl Ticker for ImmediateTicker {
    async fn tick(&mut self) {
        let previous = self.ticks.fetch_add(1, Ordering::SeqCst);
        if previous > 0 {
            if let Some((clock, step)) = &self.clock {
                clock.advance(*step);
            }
        }
        tokio::task::yield_now().await;
    }
}
