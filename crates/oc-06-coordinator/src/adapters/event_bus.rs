//! # In-Memory Event Bus
//!
//! `tokio::sync::broadcast` fan-out. Subscribers that fall behind lose the
//! oldest events and are told how many.

use crate::events::CoordinatorEvent;
use crate::ports::EventPublisher;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Broadcast event bus.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<CoordinatorEvent>,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// New subscription; sees events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> EventSubscription {
        debug!("new event subscription");
        EventSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: CoordinatorEvent) -> usize {
        let name = event.name();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(event = name, receivers, "event published");
                receivers
            }
            Err(_) => {
                warn!(event = name, "event published with no subscribers");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

/// Receiving end of the bus.
pub struct EventSubscription {
    receiver: broadcast::Receiver<CoordinatorEvent>,
}

impl EventSubscription {
    /// Next event, skipping over any lost to lag. `None` once the bus is dropped.
    pub async fn recv(&mut self) -> Option<CoordinatorEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(lagged = count, "subscriber lagged, events dropped");
                }
            }
        }
    }

    /// Next event if one is queued.
    pub fn try_recv(&mut self) -> Option<CoordinatorEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(lagged = count, "subscriber lagged, events dropped");
                }
                Err(_) => return None,
            }
        }
    }

    /// Every queued event.
    pub fn drain(&mut self) -> Vec<CoordinatorEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
