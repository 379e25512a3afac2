//! Implementations of ports (hexagonal adapters).

pub mod notifier;
pub mod simulated;

pub use notifier::ChannelNotifier;
pub use simulated::SimulatedVenue;
