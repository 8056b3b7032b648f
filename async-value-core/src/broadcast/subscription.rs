//! Consumer-side subscription handle.
//!
//! A `Subscription` is a lazy, infinite sequence of values. It ends only when
//! the registry closes its channel (unsubscribe or teardown), after any values
//! already queued have been drained.
//!
//! Dropping the subscription (or calling [`Subscription::cancel`]) is the
//! termination hook: it removes the entry from the registry exactly once.
//! The handle holds only a weak reference to the registry, so a live
//! subscription never keeps a torn-down value alive.

use std::fmt;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use futures_util::Stream;

use super::channel::Inlet;
use super::id::SubscriptionId;
use super::registry::SubscriberRegistry;
use crate::error::TryRecvError;

/// An independent, ordered stream of broadcast values.
///
/// # Example
///
/// ```rust,ignore
/// let value = ObservableValue::new("Test".to_string());
/// let mut updates = value.subscribe();
///
/// while let Some(v) = updates.next().await {
///     println!("got {v}");
/// }
/// ```
pub struct Subscription<V> {
    id: SubscriptionId,
    inlet: Inlet<V>,
    registry: Weak<SubscriberRegistry<V>>,
}

impl<V> Subscription<V> {
    pub(super) fn new(
        id: SubscriptionId,
        inlet: Inlet<V>,
        registry: Weak<SubscriberRegistry<V>>,
    ) -> Self {
        Self {
            id,
            inlet,
            registry,
        }
    }

    /// The identifier this subscription is registered under.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next value.
    ///
    /// Returns `None` once the channel has been closed and drained.
    pub async fn recv(&mut self) -> Option<V> {
        self.inlet.recv().await
    }

    /// Take the next value if one is already queued.
    pub fn try_recv(&mut self) -> Result<V, TryRecvError> {
        self.inlet.try_recv()
    }

    /// Block the current thread until the next value arrives.
    ///
    /// For consumers running on plain threads. Panics if called from inside
    /// an async runtime, like the underlying tokio receiver does.
    pub fn blocking_recv(&mut self) -> Option<V> {
        self.inlet.blocking_recv()
    }

    /// Stop consuming and unregister now.
    ///
    /// Equivalent to dropping the subscription.
    pub fn cancel(self) {
        drop(self);
    }
}

impl<V> Stream for Subscription<V> {
    type Item = V;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<V>> {
        self.get_mut().inlet.poll_recv(cx)
    }
}

impl<V> Drop for Subscription<V> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.id);
        }
    }
}

impl<V> fmt::Debug for Subscription<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("registry_alive", &(self.registry.strong_count() > 0))
            .finish()
    }
}
