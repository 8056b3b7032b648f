//! Async Value Core
//!
//! This crate provides a single-value broadcast primitive: a mutable value
//! that republishes its updates to any number of independent asynchronous
//! consumers. It implements:
//!
//! - Observable values with `AllValues` / `DistinctValues` broadcast policies
//! - A subscriber registry with per-subscriber ordered, non-blocking queues
//! - Subscriptions that are `futures::Stream`s and unregister on drop
//! - Change-driven tokio tasks for consumers with their own lifecycle
//!
//! # Architecture
//!
//! - `value`: the observable value, its policy and configuration
//! - `broadcast`: subscriber registry, subscription IDs and handles
//! - `watch`: helpers that drive a subscription on a task
//! - `error`: configuration and polling errors
//!
//! # Example
//!
//! ```rust,ignore
//! use async_value_core::{ObservableValue, Policy};
//! use futures_util::StreamExt;
//!
//! let status = ObservableValue::new("Test".to_string());
//!
//! let mut updates = status.subscribe();
//! tokio::spawn(async move {
//!     while let Some(value) = updates.next().await {
//!         println!("status: {value}");
//!     }
//! });
//!
//! status.write("Updated Value".to_string());
//! // prints: "status: Test", then "status: Updated Value"
//! ```

pub mod broadcast;
pub mod error;
pub mod value;
pub mod watch;

pub use broadcast::{SubscriberRegistry, Subscription, SubscriptionId};
pub use error::{ConfigError, TryRecvError};
pub use value::{BufferPolicy, ObservableValue, Policy, ValueConfig, WillChange};
pub use watch::{spawn_on_change, try_spawn_on_change, ChangeTask};
