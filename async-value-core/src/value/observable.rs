//! Observable value implementation
//!
//! An `ObservableValue` holds the current value of type `V` and republishes
//! accepted writes to every subscriber.
//!
//! # How Writes Work
//!
//! 1. The write takes an upgradable read lock on the value. Only one
//!    upgradable guard exists at a time, so writes and subscribes are
//!    serialised while plain readers still get through.
//!
//! 2. The policy compares the incoming value with the current one.
//!
//! 3. If accepted, the will-change hooks run. They can still `read()` the
//!    value and see the one about to be replaced.
//!
//! 4. The guard is upgraded, the current value is replaced and the new value
//!    is broadcast before the lock is released.
//!
//! Because subscribe holds the same upgradable lock, a new subscriber either
//! sees a write in its replayed value or receives it as a broadcast, never
//! both and never neither.
//!
//! # Thread Safety
//!
//! `ObservableValue<V>` is `Send + Sync` for `V: Send + Sync`. Share it with `Arc`
//! when several tasks or threads write to it.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};

use super::config::{BufferPolicy, ValueConfig};
use super::policy::Policy;
use crate::broadcast::{SubscriberRegistry, Subscription};
use crate::error::ConfigError;

/// Callback run before an accepted write replaces the current value.
///
/// Receives `(current, incoming)`.
pub type WillChange<V> = Box<dyn Fn(&V, &V) + Send + Sync>;

/// A value holder that broadcasts updates to independent async subscribers.
///
/// # Example
///
/// ```rust,ignore
/// let name = ObservableValue::new("Test".to_string());
/// let mut updates = name.subscribe();
///
/// name.write("Updated Value".to_string());
///
/// assert_eq!(updates.next().await.as_deref(), Some("Test"));
/// assert_eq!(updates.next().await.as_deref(), Some("Updated Value"));
/// ```
pub struct ObservableValue<V> {
    /// The current value. The upgradable guard serialises
    /// write/update/subscribe.
    current: RwLock<V>,

    /// Broadcast policy, fixed at construction.
    policy: Policy,

    /// Will-change hooks, in registration order.
    hooks: RwLock<Vec<WillChange<V>>>,

    /// Owned exclusively; subscriptions only hold weak references.
    registry: Arc<SubscriberRegistry<V>>,
}

impl<V> ObservableValue<V>
where
    V: Clone + PartialEq,
{
    /// Create a value that broadcasts every write.
    pub fn new(initial: V) -> Self {
        Self::with_policy(initial, Policy::AllValues)
    }

    /// Create a value with the given broadcast policy and unbounded
    /// subscriber buffers.
    pub fn with_policy(initial: V, policy: Policy) -> Self {
        Self::build(initial, policy, BufferPolicy::Unbounded)
    }

    /// Create a value from a full configuration.
    pub fn with_config(initial: V, config: ValueConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(initial, config.policy, config.buffer))
    }

    fn build(initial: V, policy: Policy, buffer: BufferPolicy) -> Self {
        Self {
            current: RwLock::new(initial),
            policy,
            hooks: RwLock::new(Vec::new()),
            registry: Arc::new(SubscriberRegistry::with_buffer(buffer)),
        }
    }

    /// Get a copy of the current value.
    ///
    /// Never waits on a write in progress unless that write is replacing the
    /// value right now, and is safe to call from a will-change hook.
    pub fn read(&self) -> V {
        self.current.read_recursive().clone()
    }

    /// Replace the current value.
    ///
    /// Returns whether the write was broadcast.
    pub fn write(&self, value: V) -> bool {
        let current = self.current.upgradable_read();
        self.apply(current, value)
    }

    /// Replace the current value with one computed from it.
    ///
    /// The read and the write happen under one lock, so concurrent updates
    /// are never lost. Returns whether the result was broadcast.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&V) -> V,
    {
        let current = self.current.upgradable_read();
        let next = f(&current);
        self.apply(current, next)
    }

    /// Compare, notify, store, broadcast.
    fn apply(&self, current: RwLockUpgradableReadGuard<'_, V>, next: V) -> bool {
        if !self.policy.accepts(&*current, &next) {
            let mut current = RwLockUpgradableReadGuard::upgrade(current);
            *current = next;
            tracing::trace!(policy = %self.policy, "Write suppressed");
            return false;
        }

        for hook in self.hooks.read().iter() {
            hook(&current, &next);
        }

        let mut current = RwLockUpgradableReadGuard::upgrade(current);
        *current = next;
        self.registry.broadcast(current.clone());
        true
    }

    /// Open an independent stream of updates.
    ///
    /// Under `AllValues` the stream starts with the current value. Under
    /// `DistinctValues` it starts with the next accepted write. Dropping the
    /// stream unsubscribes it.
    pub fn subscribe(&self) -> Subscription<V> {
        let current = self.current.upgradable_read();
        let seed = self.policy.replays_current().then(|| current.clone());
        let (_, subscription) = self.registry.subscribe_with(seed);
        subscription
    }

    /// Register a callback run before every accepted write.
    ///
    /// Hooks run synchronously before the value is replaced. A hook may
    /// `read()` this value and sees the old one. It must not write to it,
    /// subscribe to it or register further hooks; those wait on the write
    /// that is running the hook.
    pub fn on_will_change<F>(&self, hook: F)
    where
        F: Fn(&V, &V) + Send + Sync + 'static,
    {
        self.hooks.write().push(Box::new(hook));
    }
}

impl<V> ObservableValue<V> {
    /// The broadcast policy.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// The per-subscriber buffering.
    pub fn buffer(&self) -> BufferPolicy {
        self.registry.buffer()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.registry.subscriber_count()
    }

    /// Close every subscription.
    ///
    /// Each subscriber drains what is already queued and then sees the end
    /// of its stream. Later writes still update the value but reach nobody.
    /// Runs automatically on drop.
    pub fn teardown(&self) {
        self.registry.teardown();
    }
}

impl<V> Drop for ObservableValue<V> {
    fn drop(&mut self) {
        self.registry.teardown();
    }
}

impl<V> fmt::Debug for ObservableValue<V>
where
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("current", &*self.current.read_recursive())
            .field("policy", &self.policy)
            .field("subscriber_count", &self.registry.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::error::TryRecvError;

    fn drain<V>(sub: &mut Subscription<V>) -> Vec<V> {
        let mut out = Vec::new();
        while let Ok(v) = sub.try_recv() {
            out.push(v);
        }
        out
    }

    #[test]
    fn read_and_write() {
        let value = ObservableValue::new(0);
        assert_eq!(value.read(), 0);

        assert!(value.write(42));
        assert_eq!(value.read(), 42);
    }

    #[test]
    fn all_values_replays_and_repeats() {
        let value = ObservableValue::new("Test");
        let mut sub = value.subscribe();

        value.write("Updated Value");
        value.write("Updated Value");

        assert_eq!(drain(&mut sub), vec!["Test", "Updated Value", "Updated Value"]);
    }

    #[test]
    fn distinct_values_skips_replay_and_duplicates() {
        let value = ObservableValue::with_policy("Test", Policy::DistinctValues);
        let mut sub = value.subscribe();
        assert_eq!(sub.try_recv(), Err(TryRecvError::Empty));

        assert!(value.write("Updated Value"));
        assert!(!value.write("Updated Value"));

        assert_eq!(drain(&mut sub), vec!["Updated Value"]);
        assert_eq!(value.read(), "Updated Value");
    }

    #[test]
    fn distinct_values_compares_with_previous_write() {
        let value = ObservableValue::with_policy('A', Policy::DistinctValues);
        let mut sub = value.subscribe();

        value.write('B');
        value.write('A');

        assert_eq!(drain(&mut sub), vec!['B', 'A']);
    }

    #[test]
    fn update_goes_through_policy() {
        let value = ObservableValue::with_policy(10, Policy::DistinctValues);
        let mut sub = value.subscribe();

        assert!(value.update(|v| v + 5));
        assert!(!value.update(|v| *v));

        assert_eq!(value.read(), 15);
        assert_eq!(drain(&mut sub), vec![15]);
    }

    #[test]
    fn hooks_run_before_mutation_on_accepted_writes() {
        let value = ObservableValue::with_policy(String::from("Test"), Policy::DistinctValues);
        let calls = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&calls);
        value.on_will_change(move |old: &String, new: &String| {
            seen.lock().push((old.clone(), new.clone()));
        });

        value.write("Test 2".into());
        value.write("Test 2".into());
        value.write("Finish".into());

        assert_eq!(
            *calls.lock(),
            vec![
                ("Test".to_string(), "Test 2".to_string()),
                ("Test 2".to_string(), "Finish".to_string()),
            ]
        );
    }

    #[test]
    fn hooks_can_read_the_value_being_replaced() {
        let value = Arc::new(ObservableValue::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&value);
        let sink = Arc::clone(&seen);
        value.on_will_change(move |_, next: &i32| {
            if let Some(value) = weak.upgrade() {
                sink.lock().push((value.read(), *next));
            }
        });

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let writer = {
            let value = Arc::clone(&value);
            std::thread::spawn(move || {
                value.write(1);
                value.update(|v| v + 1);
                let _ = done_tx.send(());
            })
        };

        assert!(
            done_rx.recv_timeout(std::time::Duration::from_secs(2)).is_ok(),
            "write with a reading hook never completed"
        );
        writer.join().unwrap();

        assert_eq!(*seen.lock(), vec![(0, 1), (1, 2)]);
        assert_eq!(value.read(), 2);
    }

    #[test]
    fn hooks_fire_for_every_write_under_all_values() {
        let value = ObservableValue::new(1);
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        value.on_will_change(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        value.write(1);
        value.write(1);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let value = ObservableValue::new(0);
        let a = value.subscribe();
        let mut b = value.subscribe();
        assert_eq!(value.subscriber_count(), 2);

        drop(a);
        assert_eq!(value.subscriber_count(), 1);

        value.write(1);
        assert_eq!(drain(&mut b), vec![0, 1]);
    }

    #[test]
    fn teardown_ends_streams() {
        let value = ObservableValue::new(0);
        let mut sub = value.subscribe();

        value.teardown();
        value.write(1);

        assert_eq!(value.read(), 1);
        assert_eq!(value.subscriber_count(), 0);
        assert_eq!(sub.try_recv(), Ok(0));
        assert_eq!(sub.try_recv(), Err(TryRecvError::Closed));
    }

    #[test]
    fn drop_tears_down() {
        let value = ObservableValue::new(0);
        let mut sub = value.subscribe();
        drop(value);

        assert_eq!(sub.try_recv(), Ok(0));
        assert_eq!(sub.try_recv(), Err(TryRecvError::Closed));
    }

    #[test]
    fn with_config_validates() {
        let config = ValueConfig::default().buffer(BufferPolicy::Bounded { capacity: 0 });
        assert!(matches!(
            ObservableValue::with_config(0, config),
            Err(ConfigError::ZeroCapacity)
        ));

        let config = ValueConfig::default().buffer(BufferPolicy::Bounded {
            capacity: usize::MAX,
        });
        assert!(matches!(
            ObservableValue::with_config(0u8, config),
            Err(ConfigError::CapacityTooLarge { .. })
        ));

        let config = ValueConfig::default()
            .policy(Policy::DistinctValues)
            .buffer(BufferPolicy::Bounded { capacity: 4 });
        let value = ObservableValue::with_config(0, config).unwrap();
        assert_eq!(value.policy(), Policy::DistinctValues);
        assert_eq!(value.buffer(), BufferPolicy::Bounded { capacity: 4 });
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let value = Arc::new(ObservableValue::new(0u32));
        let mut sub = value.subscribe();

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let value = Arc::clone(&value);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        value.update(|v| v + 1);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(value.read(), 1000);
        // Replay plus one broadcast per update, strictly increasing
        let received = drain(&mut sub);
        assert_eq!(received, (0..=1000).collect::<Vec<_>>());
    }

    #[test]
    fn debug_shows_current() {
        let value = ObservableValue::new(7);
        let rendered = format!("{value:?}");
        assert!(rendered.contains("current: 7"));
        assert!(rendered.contains("AllValues"));
    }
}
