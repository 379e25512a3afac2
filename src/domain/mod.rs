//! Venue-agnostic trading logic.
//!
//! Everything in this module is synchronous and free of I/O: quotes come in,
//! spreads, positions and ledger updates come out.

pub mod error;
pub mod ledger;
pub mod position;
pub mod selector;
pub mod spread;
pub mod universe;

mod ids;
mod money;
mod quote;

// Core domain types
pub use ids::{AssetId, PositionId, VenueId, VenueSide};
pub use money::{Price, Rate, Volume};
pub use quote::{Quote, QuotePair};

// Evaluation and selection
pub use selector::select;
pub use spread::{rank_by_spread, Direction, FeeSchedule, Spread, SpreadEvaluator};
pub use universe::{resolve, Resolution, UniverseDiff};

// Positions and accounting
pub use error::{ErrorKind, TradeError};
pub use ledger::{CloseReceipt, Fill, FillReceipt, LedgerAccount, LegSide, Ledger, TradeStats};
pub use position::{ClosedPosition, CloseReason, HedgePosition, PositionStatus};
