//! Errors raised by the trading core.
//!
//! Every variant maps onto an [`ErrorKind`] so the health monitor can count
//! failures without caring about the details carried by the error.
//!
//! # Examples
//!
//! ```
//! use hedgelord::domain::error::{ErrorKind, TradeError};
//! use hedgelord::domain::AssetId;
//!
//! let err = TradeError::DuplicatePosition { asset: AssetId::from("BTC/USDT") };
//! assert_eq!(err.kind(), ErrorKind::DuplicatePosition);
//! ```

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use super::ids::{AssetId, PositionId, VenueId};

/// Failure classification used for counters and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorKind {
    /// A venue did not deliver a quote (error or timeout).
    QuoteUnavailable,
    /// Quotes could not be compared (stale, mismatched, non-positive).
    InvalidSnapshot,
    /// The ledger could not fund a new position.
    InsufficientBalance,
    /// A second position was requested for an asset that already has one.
    DuplicatePosition,
    /// A close was requested on a position that is already closed.
    AlreadyClosed,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Transient data errors count toward venue degradation.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::QuoteUnavailable | Self::InvalidSnapshot)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::QuoteUnavailable => "quote_unavailable",
            Self::InvalidSnapshot => "invalid_snapshot",
            Self::InsufficientBalance => "insufficient_balance",
            Self::DuplicatePosition => "duplicate_position",
            Self::AlreadyClosed => "already_closed",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Errors raised by spread evaluation, position management and the ledger.
#[derive(Error, Debug, Clone)]
pub enum TradeError {
    /// A venue failed to deliver a quote.
    #[error("quote unavailable for {asset} on {venue}: {reason}")]
    QuoteUnavailable {
        /// Venue that failed.
        venue: VenueId,
        /// Asset that was requested.
        asset: AssetId,
        /// Underlying cause.
        reason: String,
    },

    /// The quote pair cannot be used for a spread.
    #[error("invalid snapshot for {asset}: {reason}")]
    InvalidSnapshot {
        /// Asset under evaluation.
        asset: AssetId,
        /// What was wrong with the pair.
        reason: String,
    },

    /// The ledger cannot cover collateral plus fees.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Collateral plus fees for both legs.
        required: Decimal,
        /// Free balance at the time of the request.
        available: Decimal,
    },

    /// The asset already has a non-closed position.
    #[error("asset {asset} already has an open hedge position")]
    DuplicatePosition {
        /// Asset with the existing position.
        asset: AssetId,
    },

    /// The position was already closed.
    #[error("position {id} is already closed")]
    AlreadyClosed {
        /// The closed position.
        id: PositionId,
    },

    /// No position with this id exists.
    #[error("position {id} not found")]
    PositionNotFound {
        /// The requested position.
        id: PositionId,
    },

    /// Position size must be positive.
    #[error("position size must be positive, got {size}")]
    InvalidSize {
        /// The rejected size.
        size: Decimal,
    },
}

impl TradeError {
    /// Classify this error for counters and events.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::QuoteUnavailable { .. } => ErrorKind::QuoteUnavailable,
            Self::InvalidSnapshot { .. } => ErrorKind::InvalidSnapshot,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::DuplicatePosition { .. } => ErrorKind::DuplicatePosition,
            Self::AlreadyClosed { .. } => ErrorKind::AlreadyClosed,
            Self::PositionNotFound { .. } | Self::InvalidSize { .. } => ErrorKind::Unknown,
        }
    }

    /// Asset the error concerns, when it names one.
    #[must_use]
    pub const fn asset(&self) -> Option<&AssetId> {
        match self {
            Self::QuoteUnavailable { asset, .. }
            | Self::InvalidSnapshot { asset, .. }
            | Self::DuplicatePosition { asset } => Some(asset),
            _ => None,
        }
    }

    pub(crate) fn invalid_snapshot(asset: &AssetId, reason: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            asset: asset.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn kinds_are_classified() {
        let asset = AssetId::from("ETH/USDT");
        let cases = [
            (
                TradeError::QuoteUnavailable {
                    venue: VenueId::from("XT"),
                    asset: asset.clone(),
                    reason: "timeout".into(),
                },
                ErrorKind::QuoteUnavailable,
            ),
            (
                TradeError::invalid_snapshot(&asset, "stale"),
                ErrorKind::InvalidSnapshot,
            ),
            (
                TradeError::InsufficientBalance {
                    required: dec!(10),
                    available: dec!(5),
                },
                ErrorKind::InsufficientBalance,
            ),
            (
                TradeError::AlreadyClosed {
                    id: PositionId::new(1),
                },
                ErrorKind::AlreadyClosed,
            ),
            (
                TradeError::PositionNotFound {
                    id: PositionId::new(2),
                },
                ErrorKind::Unknown,
            ),
        ];

        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn only_data_errors_are_transient() {
        assert!(ErrorKind::QuoteUnavailable.is_transient());
        assert!(ErrorKind::InvalidSnapshot.is_transient());
        assert!(!ErrorKind::InsufficientBalance.is_transient());
        assert!(!ErrorKind::DuplicatePosition.is_transient());
        assert!(!ErrorKind::Unknown.is_transient());
    }

    #[test]
    fn error_messages_name_the_asset() {
        let err = TradeError::DuplicatePosition {
            asset: AssetId::from("BTC/USDT"),
        };
        assert_eq!(
            err.to_string(),
            "asset BTC/USDT already has an open hedge position"
        );
    }
}
