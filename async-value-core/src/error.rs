//! Error types.
//!
//! Subscribing, unsubscribing, broadcasting and writing never fail. Errors
//! only show up when loading configuration and when polling a subscription
//! without waiting.

use thiserror::Error;

/// Invalid or unparseable value configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A bounded buffer must hold at least one value.
    #[error("bounded buffer capacity must be at least 1")]
    ZeroCapacity,

    /// A bounded buffer larger than the channel can track.
    #[error("bounded buffer capacity {capacity} exceeds the maximum of {max}")]
    CapacityTooLarge { capacity: usize, max: usize },

    /// Policy name not recognised.
    #[error("unknown policy `{0}` (expected `all` or `distinct`)")]
    UnknownPolicy(String),

    /// Malformed JSON configuration.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why [`Subscription::try_recv`](crate::broadcast::Subscription::try_recv)
/// returned without a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    /// Nothing queued right now; the subscription is still open.
    #[error("no value available yet")]
    Empty,

    /// The subscription was closed and everything queued has been consumed.
    #[error("subscription closed")]
    Closed,
}
