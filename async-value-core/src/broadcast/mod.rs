//! Subscriber registry and fan-out
//!
//! The registry tracks every live subscriber channel for one value and
//! delivers each broadcast to all of them.
//!
//! # Architecture
//!
//! ```text
//!                     Arc<SubscriberRegistry<V>>
//!                ┌──────────────────────────────────┐
//!                │ subscribers: HashMap<            │
//!                │   SubscriptionId, Outlet<V>      │
//!                │ >                                │
//!                └───────────────┬──────────────────┘
//!                                │ broadcast(v)
//!          ┌─────────────────────┼─────────────────────┐
//!          ▼                     ▼                     ▼
//!   [Subscription]        [Subscription]        [Subscription]
//!   .next().await         .recv().await         .blocking_recv()
//!          │                     │                     │
//!          └── Drop ──► registry.unsubscribe(id) ◄─────┘
//! ```
//!
//! Each subscriber owns an independent queue, so a slow consumer never
//! holds up the writer or the other consumers.

mod channel;
mod id;
mod registry;
mod subscription;

pub use id::SubscriptionId;
pub use registry::SubscriberRegistry;
pub use subscription::Subscription;
