// crates/sync-engine/src/events.rs
//! Fan-out broadcast of bookmark events

use crate::types::BookmarkEvent;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// Delivers every published event to every current subscriber, in order.
///
/// Late subscribers see only events published after they subscribed.
/// Subscribers whose receiver was dropped are forgotten on the next publish.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<BookmarkEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber
    pub fn subscribe(&self) -> Receiver<BookmarkEvent> {
        let (tx, rx) = unbounded();
        match self.subscribers.lock() {
            Ok(mut subscribers) => subscribers.push(tx),
            Err(_) => log::error!("event bus lock poisoned; subscriber will receive nothing"),
        }
        rx
    }

    /// Sends an event to all subscribers
    pub fn publish(&self, event: BookmarkEvent) {
        log::trace!("event: {:?}", event);
        match self.subscribers.lock() {
            Ok(mut subscribers) => {
                subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
            }
            Err(_) => log::error!("event bus lock poisoned; dropping {:?}", event),
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_core::AccountId;

    #[test]
    fn test_every_subscriber_gets_every_event_in_order() {
        let bus = EventBus::new();
        let first = bus.subscribe();
        let second = bus.subscribe();
        let account_id = AccountId::new();

        bus.publish(BookmarkEvent::SyncStarted { account_id });
        bus.publish(BookmarkEvent::SyncFinished { account_id });

        for rx in [first, second] {
            assert_eq!(rx.try_recv().unwrap(), BookmarkEvent::SyncStarted { account_id });
            assert_eq!(rx.try_recv().unwrap(), BookmarkEvent::SyncFinished { account_id });
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let bus = EventBus::new();
        let account_id = AccountId::new();
        bus.publish(BookmarkEvent::SyncStarted { account_id });

        let late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(BookmarkEvent::SyncStarted {
            account_id: AccountId::new(),
        });
        assert_eq!(bus.subscriber_count(), 1);
        assert!(kept.try_recv().is_ok());
    }
}
