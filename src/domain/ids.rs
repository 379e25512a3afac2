//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tradable instrument identifier (e.g. `BTC/USDT`) - newtype for type safety.
///
/// Ordering is by identifier so that every collection of assets iterates in a
/// reproducible order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Create a new AssetId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the asset ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base currency of a `BASE/QUOTE` pair, or the whole identifier.
    pub fn base(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Human-readable venue label (e.g. `OKX`), used in events and logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueId(String);

impl VenueId {
    /// Create a new VenueId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the venue ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VenueId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Which of the two configured venues a quote, leg or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VenueSide {
    A,
    B,
}

impl VenueSide {
    /// Both sides, in evaluation order.
    pub const ALL: [VenueSide; 2] = [VenueSide::A, VenueSide::B];

    /// The opposite venue.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for VenueSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Unique hedge position identifier.
///
/// The inner u64 is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PositionId(u64);

impl PositionId {
    /// Create a new `PositionId` from a u64 value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hedge-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_id_orders_lexicographically() {
        let mut assets = vec![
            AssetId::from("SOL/USDT"),
            AssetId::from("BTC/USDT"),
            AssetId::from("ETH/USDT"),
        ];
        assets.sort();
        let names: Vec<_> = assets.iter().map(AssetId::as_str).collect();
        assert_eq!(names, vec!["BTC/USDT", "ETH/USDT", "SOL/USDT"]);
    }

    #[test]
    fn asset_id_base() {
        assert_eq!(AssetId::from("BTC/USDT").base(), "BTC");
        assert_eq!(AssetId::from("BTC").base(), "BTC");
    }

    #[test]
    fn venue_side_other() {
        assert_eq!(VenueSide::A.other(), VenueSide::B);
        assert_eq!(VenueSide::B.other(), VenueSide::A);
    }

    #[test]
    fn position_id_display() {
        assert_eq!(PositionId::new(7).to_string(), "hedge-7");
    }
}
