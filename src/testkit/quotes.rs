//! Scripted [`QuoteSource`] for engine tests.
//!
//! Prices, listings and failures are set through `&self` methods, so a test
//! can keep an `Arc` to the source it handed to the engine and change the
//! market between cycles.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{AssetId, Price, Quote, Rate, TradeError, VenueId, VenueSide};
use crate::port::{Clock, QuoteSource};

#[derive(Default)]
struct Script {
    prices: BTreeMap<AssetId, Price>,
    listing: Option<BTreeSet<AssetId>>,
    failing: BTreeSet<AssetId>,
    down: bool,
    delay: Option<Duration>,
}

/// A quote source whose market is set by the test.
///
/// Quotes are stamped with the injected clock's time. Unless set with
/// [`set_listing`](Self::set_listing), the listing is every asset that has a
/// price.
pub struct ScriptedQuoteSource {
    venue: VenueId,
    side: VenueSide,
    fee_rate: Rate,
    clock: Arc<dyn Clock>,
    script: Mutex<Script>,
    price_calls: AtomicU32,
}

impl ScriptedQuoteSource {
    pub fn new(side: VenueSide, venue: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            venue: VenueId::from(venue),
            side,
            fee_rate: Decimal::new(1, 3),
            clock,
            script: Mutex::new(Script::default()),
            price_calls: AtomicU32::new(0),
        }
    }

    pub fn with_fee_rate(mut self, fee_rate: Rate) -> Self {
        self.fee_rate = fee_rate;
        self
    }

    pub fn with_price(self, asset: &str, price: Price) -> Self {
        self.set_price(asset, price);
        self
    }

    pub fn set_price(&self, asset: &str, price: Price) {
        self.script.lock().prices.insert(AssetId::from(asset), price);
    }

    pub fn set_listing(&self, assets: &[&str]) {
        self.script.lock().listing = Some(assets.iter().map(|a| AssetId::from(*a)).collect());
    }

    /// Fail every quote request for `asset` until cleared.
    pub fn fail_asset(&self, asset: &str, failing: bool) {
        let mut script = self.script.lock();
        if failing {
            script.failing.insert(AssetId::from(asset));
        } else {
            script.failing.remove(&AssetId::from(asset));
        }
    }

    /// Fail every request, listings included.
    pub fn set_down(&self, down: bool) {
        self.script.lock().down = down;
    }

    /// Delay each quote by `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.script.lock().delay = delay;
    }

    pub fn price_calls(&self) -> u32 {
        self.price_calls.load(Ordering::SeqCst)
    }

    fn unavailable(&self, asset: &AssetId, reason: &str) -> TradeError {
        TradeError::QuoteUnavailable {
            venue: self.venue.clone(),
            asset: asset.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl QuoteSource for ScriptedQuoteSource {
    fn venue(&self) -> &VenueId {
        &self.venue
    }

    fn side(&self) -> VenueSide {
        self.side
    }

    fn fee_rate(&self) -> Rate {
        self.fee_rate
    }

    async fn get_price(&self, asset: &AssetId) -> Result<Quote, TradeError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        let (price, delay) = {
            let script = self.script.lock();
            if script.down || script.failing.contains(asset) {
                return Err(self.unavailable(asset, "scripted failure"));
            }
            (script.prices.get(asset).copied(), script.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let price = price.ok_or_else(|| self.unavailable(asset, "not listed"))?;
        Ok(Quote::new(asset.clone(), self.side, price, self.clock.now()))
    }

    async fn get_supported_assets(&self) -> Result<BTreeSet<AssetId>, TradeError> {
        let script = self.script.lock();
        if script.down {
            return Err(self.unavailable(&AssetId::from("*"), "scripted failure"));
        }
        Ok(script
            .listing
            .clone()
            .unwrap_or_else(|| script.prices.keys().cloned().collect()))
    }
}
