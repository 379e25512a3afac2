//! Simulated venue.
//!
//! Each listed asset follows a mean-reverting random walk around its anchor
//! price, and every quote adds a little noise on top. A venue may schedule a
//! new listing that appears after a number of listing requests, and may fail
//! a share of quote requests to exercise the circuit breaker.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::app::config::{ListingConfig, VenueConfig};
use crate::domain::{AssetId, Price, Quote, Rate, TradeError, VenueId, VenueSide};
use crate::port::{Clock, QuoteSource};

/// Share of the gap to the anchor closed on every step.
const REVERSION: f64 = 0.1;

#[derive(Debug, Clone)]
struct Walk {
    anchor: Price,
    mid: Price,
    volatility: f64,
}

impl Walk {
    fn new(anchor: Price, volatility: f64) -> Self {
        Self {
            anchor,
            mid: anchor,
            volatility,
        }
    }

    /// Advance one step and return a noisy quote price.
    fn step(&mut self, rng: &mut StdRng) -> Price {
        let drift = (self.anchor - self.mid) * decimal(REVERSION);
        self.mid += drift + self.anchor * decimal(shock(rng, self.volatility));
        if self.mid <= Decimal::ZERO {
            self.mid = self.anchor / Decimal::TWO;
        }
        let noise = shock(rng, self.volatility / 2.0);
        (self.mid * (Decimal::ONE + decimal(noise))).round_dp(8)
    }
}

fn shock(rng: &mut StdRng, volatility: f64) -> f64 {
    if volatility > 0.0 {
        rng.gen_range(-volatility..=volatility)
    } else {
        0.0
    }
}

fn decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

struct State {
    rng: StdRng,
    walks: BTreeMap<AssetId, Walk>,
    pending: Option<ListingConfig>,
    listing_requests: u32,
}

/// A quote source backed by seeded random walks.
pub struct SimulatedVenue {
    venue: VenueId,
    side: VenueSide,
    fee_rate: Rate,
    failure_rate: f64,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl SimulatedVenue {
    /// Create a venue from its configuration.
    ///
    /// The same `seed` always produces the same price paths for the same
    /// sequence of requests; `None` seeds from entropy.
    pub fn new(
        side: VenueSide,
        config: &VenueConfig,
        clock: Arc<dyn Clock>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let walks = config
            .assets
            .iter()
            .map(|(asset, cfg)| (asset.clone(), Walk::new(cfg.price, cfg.volatility)))
            .collect();

        Self {
            venue: VenueId::new(config.name.clone()),
            side,
            fee_rate: config.fee_rate,
            failure_rate: config.failure_rate.clamp(0.0, 1.0),
            clock,
            state: Mutex::new(State {
                rng,
                walks,
                pending: config.new_listing.clone(),
                listing_requests: 0,
            }),
        }
    }

    fn unavailable(&self, asset: &AssetId, reason: impl Into<String>) -> TradeError {
        TradeError::QuoteUnavailable {
            venue: self.venue.clone(),
            asset: asset.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl QuoteSource for SimulatedVenue {
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
        let price = {
            let mut state = self.state.lock();
            let State { rng, walks, .. } = &mut *state;

            if self.failure_rate > 0.0 && rng.gen_bool(self.failure_rate) {
                return Err(self.unavailable(asset, "simulated outage"));
            }
            let walk = walks
                .get_mut(asset)
                .ok_or_else(|| self.unavailable(asset, "not listed"))?;
            walk.step(rng)
        };

        debug!(venue = %self.venue, asset = %asset, price = %price, "Quote");
        Ok(Quote::new(asset.clone(), self.side, price, self.clock.now()))
    }

    async fn get_supported_assets(&self) -> Result<BTreeSet<AssetId>, TradeError> {
        let mut state = self.state.lock();
        state.listing_requests += 1;

        let due = state
            .pending
            .as_ref()
            .is_some_and(|listing| state.listing_requests >= listing.after_requests);
        if due {
            if let Some(listing) = state.pending.take() {
                info!(venue = %self.venue, asset = %listing.asset, "New listing");
                state
                    .walks
                    .insert(listing.asset, Walk::new(listing.price, listing.volatility));
            }
        }

        Ok(state.walks.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::AssetConfig;
    use crate::port::SystemClock;
    use rust_decimal_macros::dec;

    fn config(failure_rate: f64) -> VenueConfig {
        let mut assets = BTreeMap::new();
        assets.insert(
            AssetId::from("BTC/USDT"),
            AssetConfig {
                price: dec!(60000),
                volatility: 0.001,
            },
        );
        VenueConfig {
            name: "SIM".into(),
            fee_rate: dec!(0.001),
            failure_rate,
            assets,
            new_listing: Some(ListingConfig {
                asset: AssetId::from("SOL/USDT"),
                price: dec!(95),
                volatility: 0.005,
                after_requests: 3,
            }),
        }
    }

    fn venue(seed: u64, failure_rate: f64) -> SimulatedVenue {
        SimulatedVenue::new(
            VenueSide::A,
            &config(failure_rate),
            Arc::new(SystemClock),
            Some(seed),
        )
    }

    #[tokio::test]
    async fn same_seed_same_prices() {
        let first = venue(7, 0.0);
        let second = venue(7, 0.0);
        let btc = AssetId::from("BTC/USDT");
        for _ in 0..20 {
            let a = first.get_price(&btc).await.unwrap();
            let b = second.get_price(&btc).await.unwrap();
            assert_eq!(a.price, b.price);
            assert_eq!(a.venue, VenueSide::A);
        }
    }

    #[tokio::test]
    async fn prices_stay_near_anchor() {
        let sim = venue(42, 0.0);
        let btc = AssetId::from("BTC/USDT");
        for _ in 0..500 {
            let quote = sim.get_price(&btc).await.unwrap();
            assert!(quote.price > dec!(57000) && quote.price < dec!(63000), "{}", quote.price);
        }
    }

    #[tokio::test]
    async fn unlisted_asset_is_unavailable() {
        let sim = venue(1, 0.0);
        let err = sim.get_price(&AssetId::from("XRP/USDT")).await.unwrap_err();
        assert!(matches!(err, TradeError::QuoteUnavailable { .. }));
    }

    #[tokio::test]
    async fn scheduled_listing_appears() {
        let sim = venue(1, 0.0);
        let sol = AssetId::from("SOL/USDT");
        assert!(!sim.get_supported_assets().await.unwrap().contains(&sol));
        assert!(!sim.get_supported_assets().await.unwrap().contains(&sol));
        assert!(sim.get_supported_assets().await.unwrap().contains(&sol));
        assert!(sim.get_price(&sol).await.is_ok());
    }

    #[tokio::test]
    async fn always_failing_venue() {
        let sim = venue(1, 1.0);
        let err = sim.get_price(&AssetId::from("BTC/USDT")).await.unwrap_err();
        assert!(err.to_string().contains("simulated outage"));
    }
}
