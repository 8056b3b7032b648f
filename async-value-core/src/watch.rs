//! Change-driven tasks.
//!
//! Helpers that drive a [`Subscription`] on a tokio task and call a handler
//! for every value. The returned [`ChangeTask`] owns the loop: cancelling or
//! dropping it stops consumption, which drops the subscription and removes
//! it from its registry.
//!
//! A handler that panics or returns an error only ends its own loop. The
//! subscription is torn down like any other and the value keeps serving
//! everyone else.

use std::fmt::Display;
use std::future::Future;

use futures_util::StreamExt;
use tokio::task::{JoinError, JoinHandle};

use crate::broadcast::{Subscription, SubscriptionId};

/// Handle to a running change loop. Aborts the loop when dropped.
#[derive(Debug)]
pub struct ChangeTask {
    id: SubscriptionId,
    handle: Option<JoinHandle<()>>,
}

impl ChangeTask {
    /// The subscription this task consumes.
    pub fn subscription_id(&self) -> SubscriptionId {
        self.id
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stop the loop and wait until its subscription has been released.
    pub async fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // Cancellation is the expected outcome here.
            let _ = handle.await;
        }
    }

    /// Wait for the loop to end on its own (its stream closed, or the
    /// handler failed).
    pub async fn join(mut self) -> Result<(), JoinError> {
        match self.handle.take() {
            Some(handle) => handle.await,
            None => Ok(()),
        }
    }
}

impl Drop for ChangeTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Spawn a loop that awaits `handler` for every value `subscription` yields.
///
/// Must be called from inside a tokio runtime.
pub fn spawn_on_change<V, F, Fut>(subscription: Subscription<V>, mut handler: F) -> ChangeTask
where
    V: Send + 'static,
    F: FnMut(V) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let id = subscription.id();
    let handle = tokio::spawn(async move {
        let mut subscription = subscription;
        while let Some(value) = subscription.next().await {
            handler(value).await;
        }
        tracing::debug!(subscription = %id, "Change stream ended");
    });

    ChangeTask {
        id,
        handle: Some(handle),
    }
}

/// Like [`spawn_on_change`], but the handler may fail.
///
/// The first error is logged and ends the loop; the subscription is released.
pub fn try_spawn_on_change<V, E, F, Fut>(subscription: Subscription<V>, mut handler: F) -> ChangeTask
where
    V: Send + 'static,
    E: Display + Send + 'static,
    F: FnMut(V) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
{
    let id = subscription.id();
    let handle = tokio::spawn(async move {
        let mut subscription = subscription;
        while let Some(value) = subscription.next().await {
            if let Err(e) = handler(value).await {
                tracing::warn!(subscription = %id, error = %e, "Change handler failed, unsubscribing");
                return;
            }
        }
        tracing::debug!(subscription = %id, "Change stream ended");
    });

    ChangeTask {
        id,
        handle: Some(handle),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    use super::*;
    use crate::value::{ObservableValue, Policy};

    #[tokio::test]
    async fn handler_sees_every_value() {
        let value = ObservableValue::new(0);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let task = spawn_on_change(value.subscribe(), move |v| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(v);
            }
        });

        value.write(1);
        value.write(2);

        assert_eq!(rx.recv().await, Some(0));
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));

        task.cancel().await;
        assert_eq!(value.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn loop_ends_on_teardown() {
        let value = ObservableValue::with_policy("a", Policy::DistinctValues);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let task = spawn_on_change(value.subscribe(), move |v| {
            sink.lock().push(v);
            async {}
        });

        value.write("b");
        drop(value);

        task.join().await.unwrap();
        assert_eq!(*seen.lock(), vec!["b"]);
    }

    #[tokio::test]
    async fn dropping_task_releases_subscription() {
        let value = ObservableValue::new(0);
        let task = spawn_on_change(value.subscribe(), |_| async {});
        assert_eq!(value.subscriber_count(), 1);

        drop(task);
        for _ in 0..100 {
            if value.subscriber_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(value.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn failing_handler_unsubscribes_only_itself() {
        let value = ObservableValue::with_policy(0, Policy::DistinctValues);
        let mut healthy = value.subscribe();

        let task = try_spawn_on_change(value.subscribe(), |v: i32| async move {
            if v == 2 {
                Err(format!("cannot handle {v}"))
            } else {
                Ok(())
            }
        });
        assert_eq!(value.subscriber_count(), 2);

        value.write(1);
        value.write(2);
        task.join().await.unwrap();

        assert_eq!(value.subscriber_count(), 1);
        value.write(3);
        assert_eq!(healthy.recv().await, Some(1));
        assert_eq!(healthy.recv().await, Some(2));
        assert_eq!(healthy.recv().await, Some(3));
    }

    #[tokio::test]
    async fn panicking_handler_unsubscribes() {
        let value = ObservableValue::with_policy(0, Policy::DistinctValues);
        let task = spawn_on_change(value.subscribe(), |v: i32| async move {
            if v == 1 {
                panic!("handler blew up");
            }
        });

        value.write(1);
        let err = task.join().await.unwrap_err();
        assert!(err.is_panic());
        assert_eq!(value.subscriber_count(), 0);
    }
}
