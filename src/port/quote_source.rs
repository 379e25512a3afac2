//! Quote source port.
//!
//! A quote source is one venue's view of the market: it lists the assets it
//! trades and returns a current price for any of them. The engine holds two,
//! one per [`VenueSide`].

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::{AssetId, Quote, Rate, TradeError, VenueId, VenueSide};

/// Price feed for one venue.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - Failures are reported as [`TradeError::QuoteUnavailable`]; the engine
///   never retries within a cycle
/// - Returned quotes must carry this source's [`VenueSide`]
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Display label for events and logs.
    fn venue(&self) -> &VenueId;

    /// Slot this source fills in a quote pair.
    fn side(&self) -> VenueSide;

    /// Trading fee charged per fill on this venue.
    fn fee_rate(&self) -> Rate;

    /// Current price for `asset`.
    async fn get_price(&self, asset: &AssetId) -> Result<Quote, TradeError>;

    /// Assets currently listed on this venue.
    async fn get_supported_assets(&self) -> Result<BTreeSet<AssetId>, TradeError>;
}
