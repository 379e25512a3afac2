//! Simulated venue configuration.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::AssetId;

/// Both venues.
#[derive(Debug, Clone, Deserialize)]
pub struct VenuesConfig {
    #[serde(default = "VenueConfig::default_a")]
    pub a: VenueConfig,
    #[serde(default = "VenueConfig::default_b")]
    pub b: VenueConfig,
}

impl Default for VenuesConfig {
    fn default() -> Self {
        Self {
            a: VenueConfig::default_a(),
            b: VenueConfig::default_b(),
        }
    }
}

/// One simulated venue.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    /// Display label used in events and logs.
    pub name: String,
    /// Fee per fill (fraction of notional).
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
    /// Probability that a quote request fails.
    #[serde(default)]
    pub failure_rate: f64,
    /// Listed assets and their starting prices.
    #[serde(default)]
    pub assets: BTreeMap<AssetId, AssetConfig>,
    /// An asset that becomes listed after a number of listing requests.
    #[serde(default)]
    pub new_listing: Option<ListingConfig>,
}

/// Price model for one asset.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    /// Anchor price the walk reverts to.
    pub price: Decimal,
    /// Per-quote noise, as a fraction of the anchor.
    #[serde(default = "default_volatility")]
    pub volatility: f64,
}

/// Scheduled listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    pub asset: AssetId,
    pub price: Decimal,
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    /// Listing requests before the asset appears.
    pub after_requests: u32,
}

fn default_fee_rate() -> Decimal {
    Decimal::new(1, 3) // 0.1%
}

const fn default_volatility() -> f64 {
    0.001
}

fn asset(price: Decimal, volatility: f64) -> AssetConfig {
    AssetConfig { price, volatility }
}

impl VenueConfig {
    /// Contract venue.
    #[must_use]
    pub fn default_a() -> Self {
        let assets = [
            ("BTC/USDT", asset(Decimal::from(60000), 0.0006)),
            ("ETH/USDT", asset(Decimal::from(3000), 0.0012)),
            ("BNB/USDT", asset(Decimal::from(500), 0.0025)),
            ("ADA/USDT", asset(Decimal::new(50, 2), 0.006)),
            ("DOT/USDT", asset(Decimal::from(7), 0.0035)),
            ("SOL/USDT", asset(Decimal::new(954, 1), 0.005)),
        ];
        Self {
            name: "OKX".into(),
            fee_rate: default_fee_rate(),
            failure_rate: 0.0,
            assets: assets
                .into_iter()
                .map(|(id, cfg)| (AssetId::from(id), cfg))
                .collect(),
            new_listing: None,
        }
    }

    /// Spot venue, priced slightly below the contract venue.
    #[must_use]
    pub fn default_b() -> Self {
        let assets = [
            ("BTC/USDT", asset(Decimal::from(59800), 0.0006)),
            ("ETH/USDT", asset(Decimal::from(2990), 0.0012)),
            ("BNB/USDT", asset(Decimal::from(495), 0.0025)),
            ("ADA/USDT", asset(Decimal::new(49, 2), 0.006)),
            ("DOT/USDT", asset(Decimal::new(69, 1), 0.0035)),
        ];
        Self {
            name: "XT".into(),
            fee_rate: default_fee_rate(),
            failure_rate: 0.0,
            assets: assets
                .into_iter()
                .map(|(id, cfg)| (AssetId::from(id), cfg))
                .collect(),
            new_listing: Some(ListingConfig {
                asset: AssetId::from("SOL/USDT"),
                price: Decimal::from(95),
                volatility: 0.005,
                after_requests: 10,
            }),
        }
    }
}
