//! # Event Hub
//!
//! Fan-out of change notifications to any number of live subscribers, built on
//! `tokio::sync::broadcast`. Publishing never blocks and never fails: with no
//! subscribers the event is dropped. Slow subscribers skip ahead instead of
//! stalling publishers.
//!
//! # Example
//!
//! ```rust
//! use rollcall_events::EventHub;
//!
//! #[derive(Debug, PartialEq)]
//! struct Marked(u64);
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let hub = EventHub::new();
//!     let mut sub = hub.subscribe();
//!     hub.publish(Marked(7));
//!     assert_eq!(*sub.next().await.unwrap(), Marked(7));
//! }
//! ```

mod error;

pub use error::{EventHubError, EventHubErrorExt};

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Buffered events per subscriber before it starts skipping.
pub const DEFAULT_CAPACITY: usize = 128;

/// Cloneable publisher handle; every clone feeds the same subscribers.
pub struct EventHub<T> {
    sender: broadcast::Sender<Arc<T>>,
}

impl<T: Send + Sync + 'static> EventHub<T> {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { sender }
    }

    /// # Errors
    /// Returns [`EventHubError::InvalidCapacity`] if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self, EventHubError> {
        if capacity == 0 {
            return Err(EventHubError::InvalidCapacity {
                message: "capacity must be greater than zero".into(),
                context: None,
            });
        }
        let (sender, _) = broadcast::channel(capacity);
        Ok(Self { sender })
    }

    /// Sends `event` to every current subscriber and returns how many received it.
    pub fn publish(&self, event: T) -> usize {
        let delivered = self.sender.send(Arc::new(event)).unwrap_or(0);
        trace!(event = std::any::type_name::<T>(), delivered, "Event published");
        delivered
    }

    /// Starts receiving events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription { receiver: self.sender.subscribe(), skipped: 0 }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Send + Sync + 'static> Default for EventHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventHub<T> {
    fn clone(&self) -> Self {
        Self { sender: self.sender.clone() }
    }
}

impl<T> fmt::Debug for EventHub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub").field("subscribers", &self.sender.receiver_count()).finish()
    }
}

/// Receiving side of an [`EventHub`].
pub struct Subscription<T> {
    receiver: broadcast::Receiver<Arc<T>>,
    skipped: u64,
}

impl<T: Send + Sync + 'static> Subscription<T> {
    /// Waits for the next event. Returns `None` once every publisher is gone.
    ///
    /// A subscriber that fell behind skips the overwritten events and continues
    /// from the oldest one still buffered.
    pub async fn next(&mut self) -> Option<Arc<T>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    self.skipped = self.skipped.saturating_add(n);
                    warn!(
                        event = std::any::type_name::<T>(),
                        skipped = n,
                        total_skipped = self.skipped,
                        "Subscriber lagged; continuing from the oldest buffered event"
                    );
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Events lost to lagging so far.
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("skipped", &self.skipped).finish_non_exhaustive()
    }
}
