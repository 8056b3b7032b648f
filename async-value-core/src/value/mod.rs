//! Observable Values
//!
//! This module implements the value side of the crate: a holder for one
//! value of type `V` that decides, per [`Policy`], which writes to republish
//! through its subscriber registry.
//!
//! # Concepts
//!
//! ## Policy
//!
//! `AllValues` broadcasts every write and replays the current value to each
//! new subscriber. `DistinctValues` broadcasts only writes that differ from
//! the immediately preceding value and does not replay.
//!
//! ## Hooks
//!
//! Will-change hooks let an outside change-notification system hear about an
//! accepted write before the value is replaced. They are plain callbacks, not
//! subscriptions.
//!
//! ## Buffering
//!
//! Subscriber channels are unbounded by default. A bounded buffer is an
//! explicit opt-in through [`ValueConfig`].

mod config;
mod observable;
mod policy;

pub use config::{BufferPolicy, ValueConfig};
pub use observable::{ObservableValue, WillChange};
pub use policy::Policy;
