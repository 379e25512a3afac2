//! Notification adapters.
//!
//! Implements the `port::Notifier` trait for in-process consumers.

use tokio::sync::mpsc;

use crate::port::{Event, Notifier};

/// Forwards events to an unbounded channel.
///
/// Sending never blocks. Events sent after the receiver is dropped are
/// discarded.
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Event>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: Event) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{VenueId, VenueSide};

    #[tokio::test]
    async fn forwards_events() {
        let (notifier, mut events) = ChannelNotifier::new();
        notifier.notify(Event::VenueRecovered {
            venue: VenueId::from("OKX"),
            side: VenueSide::A,
        });

        let event = events.recv().await.unwrap();
        assert!(matches!(event, Event::VenueRecovered { side: VenueSide::A, .. }));
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (notifier, events) = ChannelNotifier::new();
        drop(events);
        notifier.notify(Event::VenueRecovered {
            venue: VenueId::from("OKX"),
            side: VenueSide::A,
        });
    }
}
