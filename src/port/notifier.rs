//! Notifier port for engine events.
//!
//! This module defines the trait for observing what the engine does:
//! detected opportunities, opened and closed hedges, failures and venue
//! health changes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{
    AssetId, CloseReason, ClosedPosition, Direction, ErrorKind, HedgePosition, PositionId, Price,
    Rate, Spread, VenueId, VenueSide, Volume,
};

/// Events emitted by the engine.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// The selector chose a spread to act on.
    OpportunityFound(OpportunityEvent),
    /// Both legs of a hedge were filled.
    PositionOpened(PositionEvent),
    /// A hedge was closed and booked.
    PositionClosed(CloseEvent),
    /// An operation failed; the cycle continued.
    ErrorOccurred(ErrorEvent),
    /// A venue crossed the failure threshold.
    VenueDegraded {
        /// The degraded venue.
        venue: VenueId,
        /// Its slot.
        side: VenueSide,
        /// When the venue is next eligible for recovery.
        until: DateTime<Utc>,
    },
    /// A degraded venue's window expired.
    VenueRecovered {
        /// The recovered venue.
        venue: VenueId,
        /// Its slot.
        side: VenueSide,
    },
    /// The tradable universe changed.
    UniverseChanged(UniverseEvent),
    /// An evaluation cycle finished.
    CycleCompleted(CycleEvent),
}

/// Opportunity selection event.
#[derive(Debug, Clone, Serialize)]
pub struct OpportunityEvent {
    pub asset: AssetId,
    pub direction: Direction,
    pub short_price: Price,
    pub long_price: Price,
    pub percent_spread: Rate,
    pub estimated_profit: Rate,
}

impl From<&Spread> for OpportunityEvent {
    fn from(spread: &Spread) -> Self {
        Self {
            asset: spread.asset.clone(),
            direction: spread.direction,
            short_price: spread.short_price,
            long_price: spread.long_price,
            percent_spread: spread.percent_spread,
            estimated_profit: spread.estimated_profit,
        }
    }
}

/// Position opened event.
#[derive(Debug, Clone, Serialize)]
pub struct PositionEvent {
    pub id: PositionId,
    pub asset: AssetId,
    pub direction: Direction,
    pub entry_short: Price,
    pub entry_long: Price,
    pub size: Volume,
    pub entry_spread: Rate,
    pub entry_fees: Decimal,
}

impl From<&HedgePosition> for PositionEvent {
    fn from(position: &HedgePosition) -> Self {
        Self {
            id: position.id(),
            asset: position.asset().clone(),
            direction: position.direction(),
            entry_short: position.entry_short(),
            entry_long: position.entry_long(),
            size: position.size(),
            entry_spread: position.entry_spread(),
            entry_fees: position.entry_fees(),
        }
    }
}

/// Position closed event.
#[derive(Debug, Clone, Serialize)]
pub struct CloseEvent {
    pub id: PositionId,
    pub asset: AssetId,
    pub reason: CloseReason,
    pub exit_short: Price,
    pub exit_long: Price,
    pub realized_pnl: Decimal,
    /// Holding time in seconds.
    pub held_secs: i64,
}

impl From<&ClosedPosition> for CloseEvent {
    fn from(closed: &ClosedPosition) -> Self {
        Self {
            id: closed.position.id(),
            asset: closed.position.asset().clone(),
            reason: closed.reason,
            exit_short: closed.exit_short,
            exit_long: closed.exit_long,
            realized_pnl: closed.realized_pnl,
            held_secs: closed.holding_time().num_seconds(),
        }
    }
}

/// Failure event.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    /// Venue at fault, if the failure is attributable to one.
    pub venue: Option<VenueId>,
    pub asset: Option<AssetId>,
    pub kind: ErrorKind,
    pub message: String,
}

/// Universe change event.
#[derive(Debug, Clone, Serialize)]
pub struct UniverseEvent {
    pub assets: Vec<AssetId>,
    pub added: Vec<AssetId>,
    pub removed: Vec<AssetId>,
    /// True when the configured defaults are in use.
    pub fallback: bool,
}

/// End-of-cycle summary event.
#[derive(Debug, Clone, Serialize)]
pub struct CycleEvent {
    pub cycle: u64,
    pub evaluated: usize,
    pub skipped: usize,
    pub opened: usize,
    pub closed: usize,
    pub open_positions: usize,
    pub balance: Decimal,
}

/// Trait for event handlers.
///
/// Implement this trait to receive events from the engine.
/// Notifications are fire-and-forget.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - The `notify` method is called from inside the evaluation cycle and
///   must not block or perform slow I/O synchronously
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        use tracing::{debug, info, warn};
        match event {
            Event::OpportunityFound(e) => {
                info!(
                    asset = %e.asset,
                    direction = %e.direction,
                    spread = %e.percent_spread,
                    profit = %e.estimated_profit,
                    "Opportunity found"
                );
            }
            Event::PositionOpened(e) => {
                info!(
                    id = %e.id,
                    asset = %e.asset,
                    direction = %e.direction,
                    short = %e.entry_short,
                    long = %e.entry_long,
                    size = %e.size,
                    "Position opened"
                );
            }
            Event::PositionClosed(e) => {
                info!(
                    id = %e.id,
                    asset = %e.asset,
                    reason = %e.reason,
                    pnl = %e.realized_pnl,
                    held_secs = e.held_secs,
                    "Position closed"
                );
            }
            Event::ErrorOccurred(e) => {
                warn!(
                    venue = ?e.venue.as_ref().map(VenueId::as_str),
                    asset = ?e.asset.as_ref().map(AssetId::as_str),
                    kind = %e.kind,
                    message = %e.message,
                    "Error occurred"
                );
            }
            Event::VenueDegraded { venue, until, .. } => {
                warn!(venue = %venue, until = %until, "Venue degraded");
            }
            Event::VenueRecovered { venue, .. } => {
                info!(venue = %venue, "Venue recovered");
            }
            Event::UniverseChanged(e) => {
                info!(
                    assets = e.assets.len(),
                    added = ?e.added,
                    removed = ?e.removed,
                    fallback = e.fallback,
                    "Universe changed"
                );
            }
            Event::CycleCompleted(e) => {
                debug!(
                    cycle = e.cycle,
                    evaluated = e.evaluated,
                    skipped = e.skipped,
                    opened = e.opened,
                    closed = e.closed,
                    open = e.open_positions,
                    balance = %e.balance,
                    "Cycle completed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingNotifier(Arc<AtomicUsize>);

    impl Notifier for CountingNotifier {
        fn notify(&self, _event: Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn recovered() -> Event {
        Event::VenueRecovered {
            venue: VenueId::from("XT"),
            side: VenueSide::B,
        }
    }

    #[test]
    fn registry_broadcasts_to_all() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut registry = NotifierRegistry::new();
        assert!(registry.is_empty());

        registry.register(Box::new(CountingNotifier(count.clone())));
        registry.register(Box::new(CountingNotifier(count.clone())));
        assert_eq!(registry.len(), 2);

        registry.notify_all(recovered());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(recovered()).unwrap();
        assert_eq!(json["event"], "venue_recovered");
        assert_eq!(json["venue"], "XT");
    }
}
