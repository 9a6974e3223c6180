//! Fan-out of change events to every live subscriber.
//!
//! The registry is the receiver set of a bounded `tokio::sync::broadcast`
//! channel: registering, dropping and sending all go through the channel's
//! internal lock, so subscribe/unsubscribe/publish can race freely. Each
//! subscriber reads from its own cursor into the ring, and a subscriber that
//! falls more than `capacity` events behind loses the oldest ones.

use crate::domain::events::ChangeEvent;
use crate::ports::notifier::ChangeNotifier;
use futures::Stream;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const DEFAULT_CAPACITY: usize = 128;

#[derive(Debug)]
pub struct Broadcaster {
    sender: broadcast::Sender<ChangeEvent>,
    next_id: AtomicU64,
    shutdown: CancellationToken,
}

impl Broadcaster {
    /// `capacity` is how many events a subscriber may fall behind before the
    /// oldest are dropped. Zero is raised to one.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds `usize::MAX / 2`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            next_id: AtomicU64::new(1),
            shutdown: CancellationToken::new(),
        }
    }

    /// Register a new subscriber. It only sees events published after this
    /// call returns.
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let subscription = Subscription {
            id,
            receiver: self.sender.subscribe(),
            shutdown: self.shutdown.clone(),
        };
        debug!(
            subscriber = id,
            total = self.subscriber_count(),
            "Subscriber registered"
        );
        subscription
    }

    /// Remove a subscriber from the registry. Dropping the handle does the same.
    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    /// Deliver `event` to every registered subscriber without waiting on any
    /// of them. Returns how many subscribers it was queued for.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        // Err only means nobody is listening
        self.sender.send(event.clone()).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// End every subscription. Pending and future `recv` calls return `None`.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeNotifier for Broadcaster {
    fn notify(&self, event: &ChangeEvent) {
        let delivered = self.publish(event);
        debug!(%event, subscribers = delivered, "Published change");
    }
}

/// Handle owned by one streaming connection.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: broadcast::Receiver<ChangeEvent>,
    shutdown: CancellationToken,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next event, in publish order.
    ///
    /// Returns `None` once the broadcaster is shut down or gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return None,
                result = self.receiver.recv() => match result {
                    Ok(event) => return Some(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            subscriber = self.id,
                            skipped,
                            "Subscriber lagging, oldest events dropped"
                        );
                    }
                    Err(RecvError::Closed) => return None,
                },
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        futures::stream::unfold(self, |mut subscription| async move {
            let event = subscription.recv().await?;
            Some((event, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!(subscriber = self.id, "Subscriber unregistered");
    }
}
