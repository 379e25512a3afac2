//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the seams between the engine and the outside world.
//! Adapters implement them; tests replace them with scripted doubles.
//!
//! # Available Ports
//!
//! - [`QuoteSource`] - Per-venue prices and listings
//! - [`Notifier`] - Event notifications (logging, channels)
//! - [`Clock`], [`Ticker`] - Current time and cycle pacing

mod clock;
mod notifier;
mod quote_source;

// Quote source port
pub use quote_source::QuoteSource;

// Notifier port
pub use notifier::{
    CloseEvent, CycleEvent, ErrorEvent, Event, LogNotifier, Notifier, NotifierRegistry,
    OpportunityEvent, PositionEvent, UniverseEvent,
};

// Time ports
pub use clock::{Clock, IntervalTicker, SystemClock, Ticker};
