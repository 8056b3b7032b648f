//! Subscription identifiers.
//!
//! Every subscription opened on a registry is keyed by a `SubscriptionId`.
//! IDs come from a process-wide counter, so an ID is never handed out twice
//! while the process lives, which also means it is never reused while its
//! channel is still registered.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque, process-unique identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocate the next unused ID.
    ///
    /// Uses an atomic counter so concurrent registries on different threads
    /// never collide.
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}
