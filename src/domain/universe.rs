//! Pair universe resolution.
//!
//! The tradable universe is the set of assets listed on both venues. When
//! the venues share nothing, the configured defaults are used unchanged.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::ids::AssetId;

/// Outcome of a universe resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    assets: Vec<AssetId>,
    fallback: bool,
}

impl Resolution {
    /// Assets to evaluate, in a reproducible order.
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// True when the venues had no asset in common and defaults were used.
    pub const fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn into_assets(self) -> Vec<AssetId> {
        self.assets
    }

    /// Assets gained and lost relative to a previous universe.
    pub fn diff(&self, previous: &[AssetId]) -> UniverseDiff {
        let before: BTreeSet<&AssetId> = previous.iter().collect();
        let after: BTreeSet<&AssetId> = self.assets.iter().collect();
        UniverseDiff {
            added: after.difference(&before).map(|a| (*a).clone()).collect(),
            removed: before.difference(&after).map(|a| (*a).clone()).collect(),
        }
    }
}

/// Change between two universes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniverseDiff {
    pub added: Vec<AssetId>,
    pub removed: Vec<AssetId>,
}

impl UniverseDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Resolve the working universe from both venues' listings.
///
/// Returns the intersection sorted by asset identifier, or `defaults`
/// unchanged when the intersection is empty.
pub fn resolve(
    venue_a: &BTreeSet<AssetId>,
    venue_b: &BTreeSet<AssetId>,
    defaults: &[AssetId],
) -> Resolution {
    // BTreeSet iteration is already ordered by identifier.
    let common: Vec<AssetId> = venue_a.intersection(venue_b).cloned().collect();

    if common.is_empty() {
        warn!(
            venue_a = venue_a.len(),
            venue_b = venue_b.len(),
            defaults = ?defaults,
            "No common assets between venues, using configured defaults"
        );
        return Resolution {
            assets: defaults.to_vec(),
            fallback: true,
        };
    }

    debug!(assets = ?common, "Resolved asset universe");
    Resolution {
        assets: common,
        fallback: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<AssetId> {
        ids.iter().map(|id| AssetId::from(*id)).collect()
    }

    fn ids(ids: &[&str]) -> Vec<AssetId> {
        ids.iter().map(|id| AssetId::from(*id)).collect()
    }

    #[test]
    fn intersection_of_listings() {
        let resolution = resolve(&set(&["BTC", "ETH", "SOL"]), &set(&["BTC", "ETH"]), &[]);
        assert_eq!(resolution.assets(), ids(&["BTC", "ETH"]).as_slice());
        assert!(!resolution.is_fallback());
    }

    #[test]
    fn intersection_is_sorted() {
        let resolution = resolve(
            &set(&["SOL/USDT", "ADA/USDT", "BTC/USDT"]),
            &set(&["BTC/USDT", "SOL/USDT", "ADA/USDT"]),
            &[],
        );
        assert_eq!(
            resolution.assets(),
            ids(&["ADA/USDT", "BTC/USDT", "SOL/USDT"]).as_slice()
        );
    }

    #[test]
    fn disjoint_listings_fall_back_to_defaults_unchanged() {
        // Defaults keep their configured order, even if unsorted.
        let defaults = ids(&["ETH/USDT", "BTC/USDT"]);
        let resolution = resolve(&set(&["BTC"]), &set(&["ETH"]), &defaults);
        assert!(resolution.is_fallback());
        assert_eq!(resolution.assets(), defaults.as_slice());
    }

    #[test]
    fn empty_listings_fall_back() {
        let resolution = resolve(&set(&[]), &set(&[]), &ids(&["BTC/USDT"]));
        assert!(resolution.is_fallback());
        assert_eq!(resolution.into_assets(), ids(&["BTC/USDT"]));
    }

    #[test]
    fn diff_reports_new_listing() {
        let previous = ids(&["BTC", "ETH"]);
        let resolution = resolve(&set(&["BTC", "ETH", "SOL"]), &set(&["BTC", "SOL"]), &[]);
        let diff = resolution.diff(&previous);
        assert_eq!(diff.added, ids(&["SOL"]));
        assert_eq!(diff.removed, ids(&["ETH"]));
        assert!(!diff.is_empty());
    }
}
