//! Error/health monitoring with a per-venue circuit breaker.
//!
//! Every failure the engine sees is recorded here. Transient data failures
//! attributed to a venue count toward that venue's degradation; once a venue
//! reaches `max_failures` within the rolling window it is degraded until one
//! full window has passed, and the engine skips every asset meanwhile.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::config::{self, HealthConfig};
use crate::domain::{ErrorKind, VenueSide};

/// Window and threshold for degradation.
#[derive(Debug, Clone, Copy)]
pub struct HealthPolicy {
    pub window: Duration,
    pub max_failures: u32,
}

impl From<&HealthConfig> for HealthPolicy {
    fn from(config: &HealthConfig) -> Self {
        Self {
            window: config::secs(config.window_secs),
            max_failures: config.max_failures,
        }
    }
}

/// One recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Venue at fault, if any.
    pub source: Option<VenueSide>,
    pub kind: ErrorKind,
    pub timestamp: DateTime<Utc>,
}

/// A change in venue health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthTransition {
    Degraded {
        side: VenueSide,
        until: DateTime<Utc>,
    },
    Recovered {
        side: VenueSide,
    },
}

/// Failure counts for one (venue, kind) key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorCount {
    pub source: Option<VenueSide>,
    pub kind: ErrorKind,
    /// Failures inside the current window.
    pub in_window: u64,
    /// Failures since start.
    pub total: u64,
}

/// Point-in-time view of the monitor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthSnapshot {
    pub counts: Vec<ErrorCount>,
    pub degraded: Vec<(VenueSide, DateTime<Utc>)>,
}

impl HealthSnapshot {
    /// Total failures since start, all keys.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| c.total).sum()
    }
}

type CountKey = (Option<VenueSide>, ErrorKind);

/// Rolling failure window plus degraded-venue state.
#[derive(Debug)]
pub struct HealthMonitor {
    policy: HealthPolicy,
    records: VecDeque<ErrorRecord>,
    totals: BTreeMap<CountKey, u64>,
    degraded: BTreeMap<VenueSide, DateTime<Utc>>,
}

impl HealthMonitor {
    #[must_use]
    pub fn new(policy: HealthPolicy) -> Self {
        Self {
            policy,
            records: VecDeque::new(),
            totals: BTreeMap::new(),
            degraded: BTreeMap::new(),
        }
    }

    /// Record a failure.
    ///
    /// Returns [`HealthTransition::Degraded`] when this failure pushes its
    /// venue over the threshold.
    pub fn record(
        &mut self,
        source: Option<VenueSide>,
        kind: ErrorKind,
        now: DateTime<Utc>,
    ) -> Option<HealthTransition> {
        self.prune(now);
        self.records.push_back(ErrorRecord {
            source,
            kind,
            timestamp: now,
        });
        *self.totals.entry((source, kind)).or_default() += 1;

        let side = source?;
        if !kind.is_transient() || self.degraded.contains_key(&side) {
            return None;
        }

        let failures = self.transient_failures(side);
        if failures < u64::from(self.policy.max_failures) {
            return None;
        }

        let until = now + self.policy.window;
        self.degraded.insert(side, until);
        warn!(
            venue = %side,
            failures,
            until = %until,
            "Venue degraded, skipping all assets"
        );
        Some(HealthTransition::Degraded { side, until })
    }

    /// Drop expired records and recover venues whose degradation ended.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> Vec<HealthTransition> {
        self.prune(now);

        let recovered: Vec<VenueSide> = self
            .degraded
            .iter()
            .filter(|(_, until)| **until <= now)
            .map(|(side, _)| *side)
            .collect();

        recovered
            .into_iter()
            .map(|side| {
                self.degraded.remove(&side);
                self.records.retain(|r| r.source != Some(side));
                info!(venue = %side, "Venue recovered");
                HealthTransition::Recovered { side }
            })
            .collect()
    }

    #[must_use]
    pub fn is_degraded(&self, side: VenueSide) -> bool {
        self.degraded.contains_key(&side)
    }

    /// True if either venue is degraded.
    #[must_use]
    pub fn any_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    /// Failures of `kind` from `source` inside the window.
    #[must_use]
    pub fn window_count(&self, source: Option<VenueSide>, kind: ErrorKind) -> u64 {
        self.records
            .iter()
            .filter(|r| r.source == source && r.kind == kind)
            .count() as u64
    }

    #[must_use]
    pub fn snapshot(&self) -> HealthSnapshot {
        let counts = self
            .totals
            .iter()
            .map(|(&(source, kind), &total)| ErrorCount {
                source,
                kind,
                in_window: self.window_count(source, kind),
                total,
            })
            .collect();
        HealthSnapshot {
            counts,
            degraded: self.degraded.iter().map(|(s, u)| (*s, *u)).collect(),
        }
    }

    fn transient_failures(&self, side: VenueSide) -> u64 {
        self.records
            .iter()
            .filter(|r| r.source == Some(side) && r.kind.is_transient())
            .count() as u64
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.policy.window;
        while self
            .records
            .front()
            .is_some_and(|r| r.timestamp <= cutoff)
        {
            self.records.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::ts;

    fn monitor(max_failures: u32) -> HealthMonitor {
        HealthMonitor::new(HealthPolicy {
            window: Duration::seconds(60),
            max_failures,
        })
    }

    #[test]
    fn degrades_on_threshold() {
        let mut health = monitor(3);
        assert!(health
            .record(Some(VenueSide::A), ErrorKind::QuoteUnavailable, ts(0))
            .is_none());
        assert!(health
            .record(Some(VenueSide::A), ErrorKind::InvalidSnapshot, ts(1_000))
            .is_none());

        let transition = health.record(Some(VenueSide::A), ErrorKind::QuoteUnavailable, ts(2_000));
        assert_eq!(
            transition,
            Some(HealthTransition::Degraded {
                side: VenueSide::A,
                until: ts(62_000),
            })
        );
        assert!(health.is_degraded(VenueSide::A));
        assert!(!health.is_degraded(VenueSide::B));

        // Already degraded: no second transition.
        assert!(health
            .record(Some(VenueSide::A), ErrorKind::QuoteUnavailable, ts(3_000))
            .is_none());
    }

    #[test]
    fn failures_outside_window_do_not_count() {
        let mut health = monitor(2);
        health.record(Some(VenueSide::B), ErrorKind::QuoteUnavailable, ts(0));
        let transition = health.record(Some(VenueSide::B), ErrorKind::QuoteUnavailable, ts(60_000));
        assert!(transition.is_none());
        assert_eq!(health.window_count(Some(VenueSide::B), ErrorKind::QuoteUnavailable), 1);
    }

    #[test]
    fn capacity_errors_never_degrade() {
        let mut health = monitor(1);
        assert!(health
            .record(Some(VenueSide::A), ErrorKind::InsufficientBalance, ts(0))
            .is_none());
        assert!(health
            .record(None, ErrorKind::QuoteUnavailable, ts(0))
            .is_none());
        assert!(!health.any_degraded());
        assert_eq!(health.snapshot().total(), 2);
    }

    #[test]
    fn recovers_after_window() {
        let mut health = monitor(1);
        health.record(Some(VenueSide::A), ErrorKind::QuoteUnavailable, ts(0));
        assert!(health.refresh(ts(59_999)).is_empty());
        assert!(health.is_degraded(VenueSide::A));

        let transitions = health.refresh(ts(60_000));
        assert_eq!(
            transitions,
            vec![HealthTransition::Recovered { side: VenueSide::A }]
        );
        assert!(!health.any_degraded());
        assert_eq!(health.window_count(Some(VenueSide::A), ErrorKind::QuoteUnavailable), 0);
    }

    #[test]
    fn snapshot_keeps_totals_after_pruning() {
        let mut health = monitor(10);
        health.record(Some(VenueSide::A), ErrorKind::QuoteUnavailable, ts(0));
        health.record(Some(VenueSide::A), ErrorKind::QuoteUnavailable, ts(1_000));
        health.refresh(ts(120_000));

        let snapshot = health.snapshot();
        assert_eq!(snapshot.counts.len(), 1);
        assert_eq!(snapshot.counts[0].total, 2);
        assert_eq!(snapshot.counts[0].in_window, 0);
    }
}
