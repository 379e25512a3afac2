//! The evaluation cycle.
//!
//! Each cycle runs, in order:
//!
//! 1. universe refresh (first cycle, then every `universe_refresh_cycles`)
//! 2. health refresh, recovering venues whose degradation expired
//! 3. quote retrieval for the universe and every held asset, both venues
//!    concurrently
//! 4. spread evaluation
//! 5. selection and open, limited to the universe
//! 6. monitoring and close of positions opened in earlier cycles
//!
//! Nothing inside a cycle is fatal. Failures are reported to the health
//! monitor and the event sink, and the cycle moves on.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::config::Config;
use super::health::{HealthMonitor, HealthPolicy, HealthTransition};
use super::manager::{PositionLimits, PositionManager};
use super::summary::RunSummary;
use crate::domain::{
    rank_by_spread, resolve, select, AssetId, CloseReason, FeeSchedule, Ledger, PositionId, Quote,
    QuotePair, Rate, Spread, SpreadEvaluator, TradeError, VenueSide,
};
use crate::port::{
    CloseEvent, Clock, CycleEvent, ErrorEvent, Event, NotifierRegistry, OpportunityEvent,
    PositionEvent, QuoteSource, Ticker, UniverseEvent,
};

/// What one cycle did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    /// Assets in the universe this cycle.
    pub universe: usize,
    /// Assets with a valid quote pair.
    pub evaluated: usize,
    /// Assets skipped for failures or degradation.
    pub skipped: usize,
    /// Spreads found across all evaluated assets.
    pub spreads: usize,
    /// Universe spreads this cycle, widest first.
    pub market: Vec<Spread>,
    /// The spread the selector chose, if any.
    pub opportunity: Option<Spread>,
    pub opened: Option<PositionId>,
    pub closed: Vec<ClosedSummary>,
    /// Failures recorded this cycle.
    pub errors: usize,
    /// True if a degraded venue stopped evaluation.
    pub degraded: bool,
    pub balance: Decimal,
    pub unrealized_pnl: Decimal,
}

/// A close performed during a cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ClosedSummary {
    pub id: PositionId,
    pub asset: AssetId,
    pub reason: CloseReason,
    pub realized_pnl: Decimal,
}

/// Drives quote sources, evaluator, selector, position manager and ledger.
pub struct Engine {
    venue_a: Arc<dyn QuoteSource>,
    venue_b: Arc<dyn QuoteSource>,
    clock: Arc<dyn Clock>,
    notifiers: NotifierRegistry,
    evaluator: SpreadEvaluator,
    manager: PositionManager,
    ledger: Ledger,
    health: HealthMonitor,
    defaults: Vec<AssetId>,
    universe: Vec<AssetId>,
    min_profit_threshold: Rate,
    position_notional: Decimal,
    quote_timeout: Duration,
    refresh_every: u64,
    close_on_exit: bool,
    cycle: u64,
    opportunities: u64,
    last_pairs: BTreeMap<AssetId, QuotePair>,
    market: Vec<Spread>,
}

impl Engine {
    /// Build an engine from configuration and its collaborators.
    ///
    /// Fees are taken from the quote sources.
    pub fn new(
        config: &Config,
        venue_a: Arc<dyn QuoteSource>,
        venue_b: Arc<dyn QuoteSource>,
        clock: Arc<dyn Clock>,
        notifiers: NotifierRegistry,
    ) -> Self {
        let fees = FeeSchedule::new(venue_a.fee_rate(), venue_b.fee_rate());
        Self {
            evaluator: SpreadEvaluator::new(fees, config.simulation.staleness()),
            manager: PositionManager::new(PositionLimits::from(&config.trading), fees),
            ledger: Ledger::new(config.trading.initial_balance),
            health: HealthMonitor::new(HealthPolicy::from(&config.health)),
            defaults: config.trading.supported_pairs.clone(),
            universe: Vec::new(),
            min_profit_threshold: config.trading.min_profit_threshold,
            position_notional: config.trading.position_size,
            quote_timeout: config.simulation.quote_timeout(),
            refresh_every: config.simulation.universe_refresh_cycles.max(1),
            close_on_exit: config.simulation.close_on_exit,
            cycle: 0,
            opportunities: 0,
            last_pairs: BTreeMap::new(),
            market: Vec::new(),
            venue_a,
            venue_b,
            clock,
            notifiers,
        }
    }

    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub const fn positions(&self) -> &PositionManager {
        &self.manager
    }

    #[must_use]
    pub const fn health(&self) -> &HealthMonitor {
        &self.health
    }

    #[must_use]
    pub const fn evaluator(&self) -> &SpreadEvaluator {
        &self.evaluator
    }

    /// Current asset universe.
    #[must_use]
    pub fn universe(&self) -> &[AssetId] {
        &self.universe
    }

    /// Cycles completed so far.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Latest valid quote pair per asset.
    #[must_use]
    pub const fn last_pairs(&self) -> &BTreeMap<AssetId, QuotePair> {
        &self.last_pairs
    }

    /// Universe spreads of the last evaluated cycle, widest first.
    #[must_use]
    pub fn market(&self) -> &[Spread] {
        &self.market
    }

    /// Point-in-time summary for reporting.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary::capture(self, self.opportunities)
    }

    /// Run cycles until shutdown is signalled or `max_cycles` is reached.
    ///
    /// Shutdown is observed only between cycles; a cycle in progress always
    /// completes.
    pub async fn run(
        &mut self,
        ticker: &mut dyn Ticker,
        mut shutdown: watch::Receiver<bool>,
        max_cycles: Option<u64>,
    ) {
        info!(
            venue_a = %self.venue_a.venue(),
            venue_b = %self.venue_b.venue(),
            balance = %self.ledger.account().balance,
            "Starting engine"
        );

        loop {
            if *shutdown.borrow() {
                info!("Shutdown signal received");
                break;
            }
            if max_cycles.is_some_and(|max| self.cycle >= max) {
                info!(cycles = self.cycle, "Cycle limit reached");
                break;
            }

            tokio::select! {
                result = shutdown.changed() => {
                    match result {
                        Ok(()) => {
                            if *shutdown.borrow() {
                                info!("Shutdown signal received");
                                break;
                            }
                        }
                        Err(_) => {
                            info!("Shutdown channel closed");
                            break;
                        }
                    }
                }
                () = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        if self.close_on_exit {
            self.close_all();
        }
        info!(cycles = self.cycle, "Engine stopped");
    }

    /// Run one evaluation cycle.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;
        let cycle = self.cycle;
        let now = self.clock.now();
        let mut report = CycleReport {
            cycle,
            ..CycleReport::default()
        };

        if cycle == 1 || (cycle - 1) % self.refresh_every == 0 {
            self.refresh_universe(now, &mut report).await;
        }
        report.universe = self.universe.len();

        for transition in self.health.refresh(now) {
            self.emit_transition(transition);
        }

        if self.health.any_degraded() {
            debug!(cycle, "Venue degraded, skipping cycle evaluation");
            report.degraded = true;
            report.skipped = self.universe.len();
            return self.finish(report);
        }

        // Held assets stay quoted after leaving the universe.
        let mut targets = self.universe.clone();
        for asset in self.manager.active_assets() {
            if !targets.contains(&asset) {
                targets.push(asset);
            }
        }

        let (pairs, spreads) = self.collect(&targets, now, &mut report).await;
        report.spreads = spreads.len();

        // Keep last seen prices only for assets still quoted or held.
        let keep: BTreeSet<&AssetId> = targets.iter().collect();
        self.last_pairs.retain(|asset, _| keep.contains(asset));
        self.last_pairs.extend(pairs.clone());

        let tradable: Vec<Spread> = spreads
            .into_iter()
            .filter(|spread| self.universe.contains(&spread.asset))
            .collect();
        let market = rank_by_spread(tradable);
        self.try_open(&market, now, cycle, &mut report);
        self.market.clone_from(&market);
        report.market = market;
        self.monitor(&pairs, now, cycle, &mut report);

        self.finish(report)
    }

    /// Close every active position at the last seen prices.
    pub fn close_all(&mut self) {
        let now = self.clock.now();
        let ids: Vec<PositionId> = self.manager.active().map(|p| p.id()).collect();
        for id in ids {
            let Some(asset) = self.manager.get(id).map(|p| p.asset().clone()) else {
                continue;
            };
            let Some(pair) = self.last_pairs.get(&asset).cloned() else {
                warn!(id = %id, asset = %asset, "No prices to close position at");
                continue;
            };
            if let Err(err) = self.close_position(id, &pair, CloseReason::Manual, now) {
                self.report_error(None, &err, now);
            }
        }
    }

    async fn refresh_universe(&mut self, now: DateTime<Utc>, report: &mut CycleReport) {
        let (listed_a, listed_b) = tokio::join!(
            self.venue_a.get_supported_assets(),
            self.venue_b.get_supported_assets()
        );

        let (listed_a, listed_b) = match (listed_a, listed_b) {
            (Ok(a), Ok(b)) => (a, b),
            (a, b) => {
                for (side, result) in [(VenueSide::A, a), (VenueSide::B, b)] {
                    if let Err(err) = result {
                        self.report_error(Some(side), &err, now);
                        report.errors += 1;
                    }
                }
                if self.universe.is_empty() {
                    warn!("Listings unavailable, using configured defaults");
                    self.universe = self.defaults.clone();
                }
                return;
            }
        };

        let resolution = resolve(&listed_a, &listed_b, &self.defaults);
        let diff = resolution.diff(&self.universe);
        if diff.is_empty() {
            return;
        }
        if !self.universe.is_empty() && !diff.added.is_empty() {
            info!(added = ?diff.added, "New trading pairs");
        }

        let fallback = resolution.is_fallback();
        self.universe = resolution.into_assets();
        info!(assets = ?self.universe, fallback, "Universe resolved");
        self.notifiers.notify_all(Event::UniverseChanged(UniverseEvent {
            assets: self.universe.clone(),
            added: diff.added,
            removed: diff.removed,
            fallback,
        }));
    }

    /// Fetch, validate and evaluate quotes for `assets`.
    async fn collect(
        &mut self,
        assets: &[AssetId],
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> (BTreeMap<AssetId, QuotePair>, Vec<Spread>) {
        let limit = self.quote_timeout;
        let fetches = assets.iter().map(|asset| {
            let venue_a = Arc::clone(&self.venue_a);
            let venue_b = Arc::clone(&self.venue_b);
            async move {
                let (quote_a, quote_b) = tokio::join!(
                    fetch_quote(venue_a.as_ref(), asset, limit),
                    fetch_quote(venue_b.as_ref(), asset, limit)
                );
                (asset.clone(), quote_a, quote_b)
            }
        });
        let results = join_all(fetches).await;

        let mut pairs = BTreeMap::new();
        let mut spreads = Vec::new();

        for (asset, quote_a, quote_b) in results {
            let (quote_a, quote_b) = match (quote_a, quote_b) {
                (Ok(a), Ok(b)) => (a, b),
                (a, b) => {
                    for (side, result) in [(VenueSide::A, a), (VenueSide::B, b)] {
                        if let Err(err) = result {
                            self.report_error(Some(side), &err, now);
                            report.errors += 1;
                        }
                    }
                    report.skipped += 1;
                    continue;
                }
            };

            let culprit = snapshot_culprit(&asset, &quote_a, &quote_b);
            match self.evaluator.snapshot(&asset, quote_a, quote_b, now) {
                Ok(pair) => {
                    spreads.extend(self.evaluator.spreads(&pair));
                    pairs.insert(asset, pair);
                    report.evaluated += 1;
                }
                Err(err) => {
                    self.report_error(culprit, &err, now);
                    report.errors += 1;
                    report.skipped += 1;
                }
            }
        }

        (pairs, spreads)
    }

    fn try_open(
        &mut self,
        spreads: &[Spread],
        now: DateTime<Utc>,
        cycle: u64,
        report: &mut CycleReport,
    ) {
        if !self.manager.has_capacity() {
            debug!(
                open = self.manager.active_count(),
                "At position capacity, not opening"
            );
            return;
        }

        let Some(spread) = select(
            spreads,
            &self.manager.active_assets(),
            self.min_profit_threshold,
        ) else {
            return;
        };

        self.opportunities += 1;
        self.notifiers
            .notify_all(Event::OpportunityFound(OpportunityEvent::from(&spread)));

        let result = self
            .position_notional
            .checked_div(spread.long_price)
            .map(|size| size.round_dp(8))
            .ok_or(TradeError::InvalidSize {
                size: Decimal::ZERO,
            })
            .and_then(|size| {
                self.manager
                    .open(&spread, size, &mut self.ledger, now, cycle)
            });

        match result {
            Ok(position) => {
                report.opened = Some(position.id());
                self.notifiers
                    .notify_all(Event::PositionOpened(PositionEvent::from(&position)));
            }
            Err(err) => {
                self.report_error(None, &err, now);
                report.errors += 1;
            }
        }
        report.opportunity = Some(spread);
    }

    fn monitor(
        &mut self,
        pairs: &BTreeMap<AssetId, QuotePair>,
        now: DateTime<Utc>,
        cycle: u64,
        report: &mut CycleReport,
    ) {
        let due: Vec<(PositionId, AssetId)> = self
            .manager
            .active()
            .filter(|p| p.entry_cycle() < cycle)
            .map(|p| (p.id(), p.asset().clone()))
            .collect();

        for (id, asset) in due {
            let Some(pair) = pairs.get(&asset) else {
                debug!(id = %id, asset = %asset, "No fresh quotes, not monitored this cycle");
                continue;
            };

            let decision = self.manager.evaluate_close(id, pair, now);
            let result = match decision {
                Ok(Some(reason)) => self.close_position(id, pair, reason, now).map(Some),
                Ok(None) => Ok(None),
                Err(err) => Err(err),
            };

            match result {
                Ok(Some(closed)) => report.closed.push(closed),
                Ok(None) => {}
                Err(err) => {
                    self.report_error(None, &err, now);
                    report.errors += 1;
                }
            }
        }
    }

    fn close_position(
        &mut self,
        id: PositionId,
        pair: &QuotePair,
        reason: CloseReason,
        now: DateTime<Utc>,
    ) -> Result<ClosedSummary, TradeError> {
        let realized_pnl = self.manager.close(id, pair, reason, &mut self.ledger, now)?;
        if let Some(closed) = self.manager.closed().last() {
            self.notifiers
                .notify_all(Event::PositionClosed(CloseEvent::from(closed)));
        }
        Ok(ClosedSummary {
            id,
            asset: pair.asset().clone(),
            reason,
            realized_pnl,
        })
    }

    fn finish(&mut self, mut report: CycleReport) -> CycleReport {
        report.balance = self.ledger.account().balance;
        report.unrealized_pnl = self.manager.unrealized_pnl(&self.last_pairs);

        self.notifiers
            .notify_all(Event::CycleCompleted(CycleEvent {
                cycle: report.cycle,
                evaluated: report.evaluated,
                skipped: report.skipped,
                opened: usize::from(report.opened.is_some()),
                closed: report.closed.len(),
                open_positions: self.manager.active_count(),
                balance: report.balance,
            }));
        report
    }

    fn report_error(&mut self, source: Option<VenueSide>, err: &TradeError, now: DateTime<Utc>) {
        let kind = err.kind();
        if kind.is_transient() {
            debug!(venue = ?source, kind = %kind, error = %err, "Transient failure");
        } else {
            warn!(venue = ?source, kind = %kind, error = %err, "Operation failed");
        }

        self.notifiers.notify_all(Event::ErrorOccurred(ErrorEvent {
            venue: source.map(|side| self.source(side).venue().clone()),
            asset: err.asset().cloned(),
            kind,
            message: err.to_string(),
        }));

        if let Some(transition) = self.health.record(source, kind, now) {
            self.emit_transition(transition);
        }
    }

    fn emit_transition(&self, transition: HealthTransition) {
        let event = match transition {
            HealthTransition::Degraded { side, until } => Event::VenueDegraded {
                venue: self.source(side).venue().clone(),
                side,
                until,
            },
            HealthTransition::Recovered { side } => Event::VenueRecovered {
                venue: self.source(side).venue().clone(),
                side,
            },
        };
        self.notifiers.notify_all(event);
    }

    fn source(&self, side: VenueSide) -> &dyn QuoteSource {
        match side {
            VenueSide::A => self.venue_a.as_ref(),
            VenueSide::B => self.venue_b.as_ref(),
        }
    }
}

/// Request a quote, turning a timeout into [`TradeError::QuoteUnavailable`].
async fn fetch_quote(
    source: &dyn QuoteSource,
    asset: &AssetId,
    limit: Duration,
) -> Result<Quote, TradeError> {
    match tokio::time::timeout(limit, source.get_price(asset)).await {
        Ok(result) => result,
        Err(_) => Err(TradeError::QuoteUnavailable {
            venue: source.venue().clone(),
            asset: asset.clone(),
            reason: format!("timed out after {}ms", limit.as_millis()),
        }),
    }
}

/// The venue to blame for an unusable quote pair.
///
/// Wrong asset or non-positive price point at that venue; otherwise the
/// older quote is the stale one. Equal timestamps blame nobody.
fn snapshot_culprit(asset: &AssetId, quote_a: &Quote, quote_b: &Quote) -> Option<VenueSide> {
    for quote in [quote_a, quote_b] {
        if &quote.asset != asset || quote.price <= Decimal::ZERO {
            return Some(quote.venue);
        }
    }
    match quote_a.timestamp.cmp(&quote_b.timestamp) {
        std::cmp::Ordering::Less => Some(VenueSide::A),
        std::cmp::Ordering::Greater => Some(VenueSide::B),
        std::cmp::Ordering::Equal => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::{quote_at, ts};
    use rust_decimal_macros::dec;

    #[test]
    fn culprit_is_the_stale_venue() {
        let asset = AssetId::from("BTC/USDT");
        let a = quote_at("BTC/USDT", VenueSide::A, dec!(100), ts(0));
        let b = quote_at("BTC/USDT", VenueSide::B, dec!(100), ts(9_000));
        assert_eq!(snapshot_culprit(&asset, &a, &b), Some(VenueSide::A));
        assert_eq!(snapshot_culprit(&asset, &a, &a), None);
    }

    #[test]
    fn culprit_is_the_bad_price() {
        let asset = AssetId::from("BTC/USDT");
        let a = quote_at("BTC/USDT", VenueSide::A, dec!(100), ts(0));
        let b = quote_at("BTC/USDT", VenueSide::B, dec!(0), ts(0));
        assert_eq!(snapshot_culprit(&asset, &a, &b), Some(VenueSide::B));
    }
}
