//! Fan-out broadcast registry for Skylift.
//!
//! [`Broadcaster`] holds one outbound channel per live subscriber and
//! delivers each published message to all of them. A subscriber whose
//! channel has closed (its connection handler exited) is removed during
//! the same publish pass, so dead entries never accumulate.
//!
//! Registration and deregistration are safe concurrently with an
//! in-progress publish: the registry sits behind a mutex, and every send
//! is a non-blocking push onto an unbounded channel, so a publish can
//! never stall the engine's tick loop on subscriber I/O.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use tokio::sync::mpsc;

/// Opaque identifier for a registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Registry<T> {
    next_id: u64,
    subscribers: HashMap<SubscriberId, mpsc::UnboundedSender<T>>,
}

/// A concurrency-safe fan-out of messages to all live subscribers.
pub struct Broadcaster<T> {
    registry: Mutex<Registry<T>>,
}

impl<T: Clone> Broadcaster<T> {
    /// Creates a broadcaster with no subscribers.
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                next_id: 1,
                subscribers: HashMap::new(),
            }),
        }
    }

    /// Registers a new subscriber and returns its id plus the receiving
    /// end of its channel.
    pub fn subscribe(&self) -> (SubscriberId, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.lock();
        let id = SubscriberId(registry.next_id);
        registry.next_id += 1;
        registry.subscribers.insert(id, tx);
        tracing::debug!(%id, total = registry.subscribers.len(), "subscriber registered");
        (id, rx)
    }

    /// Removes a subscriber. Safe to call for an id that was already
    /// pruned by a publish pass.
    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut registry = self.lock();
        if registry.subscribers.remove(&id).is_some() {
            tracing::debug!(%id, total = registry.subscribers.len(), "subscriber removed");
        }
    }

    /// Delivers `message` to every live subscriber.
    ///
    /// Subscribers whose channel has closed are dropped from the registry
    /// in the same pass. Never blocks.
    pub fn publish(&self, message: &T) {
        let mut registry = self.lock();
        registry.subscribers.retain(|id, tx| {
            if tx.send(message.clone()).is_ok() {
                true
            } else {
                tracing::debug!(%id, "subscriber gone, dropping");
                false
            }
        });
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry<T>> {
        self.registry.lock().expect("broadcast registry poisoned")
    }
}

impl<T: Clone> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let broadcaster = Broadcaster::new();
        let (_, mut rx1) = broadcaster.subscribe();
        let (_, mut rx2) = broadcaster.subscribe();

        broadcaster.publish(&"tick");

        assert_eq!(rx1.recv().await, Some("tick"));
        assert_eq!(rx2.recv().await, Some("tick"));
    }

    #[tokio::test]
    async fn test_dead_subscriber_pruned_during_publish() {
        let broadcaster = Broadcaster::new();
        let (_, rx1) = broadcaster.subscribe();
        let (_, mut rx2) = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        drop(rx1);
        broadcaster.publish(&1u32);

        assert_eq!(broadcaster.subscriber_count(), 1);
        assert_eq!(rx2.recv().await, Some(1));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let broadcaster = Broadcaster::new();
        let (id, mut rx) = broadcaster.subscribe();

        broadcaster.unsubscribe(id);
        broadcaster.publish(&"gone");

        assert_eq!(broadcaster.subscriber_count(), 0);
        // Channel closes once the sender side is dropped from the registry.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_id_is_noop() {
        let broadcaster = Broadcaster::<u32>::new();
        let (id, rx) = broadcaster.subscribe();
        drop(rx);
        broadcaster.publish(&0);

        // Already pruned; a late unsubscribe must not panic.
        broadcaster.unsubscribe(id);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_during_publish_from_other_thread() {
        use std::sync::Arc;

        let broadcaster = Arc::new(Broadcaster::new());
        let publisher = {
            let broadcaster = Arc::clone(&broadcaster);
            std::thread::spawn(move || {
                for i in 0..1000u32 {
                    broadcaster.publish(&i);
                }
            })
        };

        let mut receivers = Vec::new();
        for _ in 0..50 {
            receivers.push(broadcaster.subscribe());
        }
        publisher.join().unwrap();

        // Every subscriber registered mid-stream still has a live channel.
        assert_eq!(broadcaster.subscriber_count(), 50);
    }
}
