//! Per-subscriber channels.
//!
//! Each subscription gets its own single-consumer queue. The registry keeps
//! the sending half (`Outlet`) and the subscriber keeps the receiving half
//! (`Inlet`). Both halves come in an unbounded flavour (the default) and a
//! bounded one, selected by [`BufferPolicy`].
//!
//! Sending never blocks: an unbounded queue always accepts, and a full bounded
//! queue refuses the incoming value for that subscriber only.

use std::task::{Context, Poll};

use tokio::sync::{mpsc, Semaphore};

use crate::error::TryRecvError;
use crate::value::BufferPolicy;

/// Outcome of handing one value to one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// The value was queued.
    Sent,
    /// The bounded queue was full; the value was discarded.
    Dropped,
    /// The receiving half is gone.
    Closed,
}

/// Sending half, owned by the registry.
pub(crate) enum Outlet<V> {
    Unbounded(mpsc::UnboundedSender<V>),
    Bounded(mpsc::Sender<V>),
}

impl<V> Outlet<V> {
    pub(crate) fn deliver(&self, value: V) -> Delivery {
        match self {
            Outlet::Unbounded(tx) => match tx.send(value) {
                Ok(()) => Delivery::Sent,
                Err(_) => Delivery::Closed,
            },
            Outlet::Bounded(tx) => match tx.try_send(value) {
                Ok(()) => Delivery::Sent,
                Err(mpsc::error::TrySendError::Full(_)) => Delivery::Dropped,
                Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
            },
        }
    }
}

/// Receiving half, owned by a [`Subscription`](super::Subscription).
pub(crate) enum Inlet<V> {
    Unbounded(mpsc::UnboundedReceiver<V>),
    Bounded(mpsc::Receiver<V>),
}

impl<V> Inlet<V> {
    pub(crate) fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<V>> {
        match self {
            Inlet::Unbounded(rx) => rx.poll_recv(cx),
            Inlet::Bounded(rx) => rx.poll_recv(cx),
        }
    }

    pub(crate) async fn recv(&mut self) -> Option<V> {
        match self {
            Inlet::Unbounded(rx) => rx.recv().await,
            Inlet::Bounded(rx) => rx.recv().await,
        }
    }

    pub(crate) fn try_recv(&mut self) -> Result<V, TryRecvError> {
        let result = match self {
            Inlet::Unbounded(rx) => rx.try_recv(),
            Inlet::Bounded(rx) => rx.try_recv(),
        };
        result.map_err(|e| match e {
            mpsc::error::TryRecvError::Empty => TryRecvError::Empty,
            mpsc::error::TryRecvError::Disconnected => TryRecvError::Closed,
        })
    }

    pub(crate) fn blocking_recv(&mut self) -> Option<V> {
        match self {
            Inlet::Unbounded(rx) => rx.blocking_recv(),
            Inlet::Bounded(rx) => rx.blocking_recv(),
        }
    }
}

/// Create a fresh channel pair for one subscriber.
pub(crate) fn channel<V>(buffer: BufferPolicy) -> (Outlet<V>, Inlet<V>) {
    match buffer {
        BufferPolicy::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (Outlet::Unbounded(tx), Inlet::Unbounded(rx))
        }
        BufferPolicy::Bounded { capacity } => {
            // mpsc::channel panics outside 1..=MAX_PERMITS.
            let (tx, rx) = mpsc::channel(capacity.clamp(1, Semaphore::MAX_PERMITS));
            (Outlet::Bounded(tx), Inlet::Bounded(rx))
        }
    }
}
