//! Subscriber registry implementation
//!
//! The registry owns the sending half of every live subscriber channel,
//! keyed by [`SubscriptionId`]. It is the only place subscriber channels are
//! created, stored, or closed.
//!
//! # Consistency
//!
//! The map sits behind a single `RwLock`:
//!
//! - `subscribe`, `unsubscribe` and `teardown` take the write lock.
//! - `broadcast` holds the read lock for the whole fan-out, so it delivers to
//!   exactly the set registered when it started. Removals that race with it
//!   wait until it finishes.
//!
//! Sends are non-blocking, so the read lock is never held across a wait.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::channel::{self, Delivery, Outlet};
use super::id::SubscriptionId;
use super::subscription::Subscription;
use crate::value::BufferPolicy;

/// Registry state guarded by the lock.
struct Slots<V> {
    subscribers: HashMap<SubscriptionId, Outlet<V>>,
    /// Set once by `teardown`; new subscriptions are closed immediately.
    torn_down: bool,
}

/// Set of live subscriber channels for one value.
///
/// Always used behind an `Arc`: subscriptions keep a weak reference back to
/// it so they can unregister themselves when dropped.
pub struct SubscriberRegistry<V> {
    slots: RwLock<Slots<V>>,
    buffer: BufferPolicy,
}

impl<V> SubscriberRegistry<V> {
    /// Create an empty registry with unbounded subscriber channels.
    pub fn new() -> Self {
        Self::with_buffer(BufferPolicy::Unbounded)
    }

    /// Create an empty registry whose subscriber channels use `buffer`.
    ///
    /// Unlike [`ValueConfig::validate`](crate::value::ValueConfig::validate),
    /// this does not reject out-of-range capacities: a bounded capacity is
    /// clamped to `1..=BufferPolicy::MAX_CAPACITY` when each channel is
    /// created, so `Bounded { capacity: 0 }` behaves like capacity 1.
    pub fn with_buffer(buffer: BufferPolicy) -> Self {
        Self {
            slots: RwLock::new(Slots {
                subscribers: HashMap::new(),
                torn_down: false,
            }),
            buffer,
        }
    }

    /// The buffering applied to each subscriber channel.
    pub fn buffer(&self) -> BufferPolicy {
        self.buffer
    }

    /// Open a new subscription.
    pub fn subscribe(self: &Arc<Self>) -> (SubscriptionId, Subscription<V>) {
        self.subscribe_with(None)
    }

    /// Open a new subscription, queueing `seed` ahead of any broadcast.
    ///
    /// The seed is enqueued before the channel becomes visible to
    /// `broadcast`, so it is always the first element the subscriber sees.
    /// After teardown the returned subscription yields the seed (if any) and
    /// then ends.
    pub fn subscribe_with(self: &Arc<Self>, seed: Option<V>) -> (SubscriptionId, Subscription<V>) {
        let id = SubscriptionId::next();
        let (outlet, inlet) = channel::channel(self.buffer);

        if let Some(value) = seed {
            outlet.deliver(value);
        }

        let mut slots = self.slots.write();
        if slots.torn_down {
            tracing::debug!(subscription = %id, "Subscribe after teardown, closing immediately");
            drop(outlet);
        } else {
            slots.subscribers.insert(id, outlet);
            tracing::debug!(
                subscription = %id,
                subscribers = slots.subscribers.len(),
                "Subscriber added"
            );
        }
        drop(slots);

        (id, Subscription::new(id, inlet, Arc::downgrade(self)))
    }

    /// Remove and close the channel registered under `id`.
    ///
    /// Idempotent: unknown or already-removed IDs are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut slots = self.slots.write();
        if slots.subscribers.remove(&id).is_some() {
            tracing::debug!(
                subscription = %id,
                subscribers = slots.subscribers.len(),
                "Subscriber removed"
            );
        }
    }

    /// Close every channel and empty the registry.
    ///
    /// Consumers drain whatever is already queued and then see the end of
    /// their stream.
    pub fn teardown(&self) {
        let mut slots = self.slots.write();
        if slots.torn_down {
            return;
        }
        slots.torn_down = true;
        let closed = slots.subscribers.len();
        slots.subscribers.clear();

        tracing::debug!(closed = closed, "Registry torn down");
    }

    /// Whether `teardown` has run.
    pub fn is_torn_down(&self) -> bool {
        self.slots.read().torn_down
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.slots.read().subscribers.len()
    }

    /// Whether `id` is currently registered.
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.slots.read().subscribers.contains_key(&id)
    }
}

impl<V: Clone> SubscriberRegistry<V> {
    /// Deliver `value` to every registered subscriber.
    ///
    /// Returns the number of subscribers the value was queued for.
    pub fn broadcast(&self, value: V) -> usize {
        let slots = self.slots.read();
        let mut delivered = 0;

        for (id, outlet) in slots.subscribers.iter() {
            match outlet.deliver(value.clone()) {
                Delivery::Sent => delivered += 1,
                Delivery::Dropped => {
                    tracing::warn!(
                        subscription = %id,
                        "Subscriber buffer full, dropping value"
                    );
                }
                // Receiver is mid-drop; its termination hook removes the entry.
                Delivery::Closed => {}
            }
        }

        tracing::trace!(
            subscribers = slots.subscribers.len(),
            delivered = delivered,
            "Broadcast"
        );

        delivered
    }
}

impl<V> Default for SubscriberRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}
