//! Opportunity selection.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::ids::AssetId;
use super::money::Rate;
use super::spread::Spread;

/// Pick the spread to act on, if any.
///
/// Skips assets that already hold a position and spreads whose
/// `estimated_profit` is below `min_profit_threshold`. Among the rest the
/// highest estimated profit wins; exact ties go to the smallest asset
/// identifier. Returns `None` when nothing qualifies.
pub fn select(
    spreads: &[Spread],
    open_positions: &BTreeSet<AssetId>,
    min_profit_threshold: Rate,
) -> Option<Spread> {
    spreads
        .iter()
        .filter(|s| !open_positions.contains(&s.asset))
        .filter(|s| s.estimated_profit >= min_profit_threshold)
        .max_by(|x, y| rank(x, y))
        .cloned()
}

/// Higher profit ranks higher; on equal profit the smaller asset ranks higher.
fn rank(x: &Spread, y: &Spread) -> Ordering {
    x.estimated_profit
        .cmp(&y.estimated_profit)
        .then_with(|| y.asset.cmp(&x.asset))
}
