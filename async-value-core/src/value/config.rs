//! Observable value configuration
//!
//! Configuration is plain data: it can be built in code with the builder
//! methods or loaded from JSON.
//!
//! ```rust,ignore
//! let config = ValueConfig::default()
//!     .policy(Policy::DistinctValues)
//!     .buffer(BufferPolicy::Bounded { capacity: 64 });
//!
//! let config = ValueConfig::from_json(r#"{ "policy": "distinct_values" }"#)?;
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use super::policy::Policy;
use crate::error::ConfigError;

/// How much each subscriber channel may hold before values are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferPolicy {
    /// No limit. Nothing is ever dropped while a subscriber is registered.
    #[default]
    Unbounded,

    /// At most `capacity` queued values per subscriber. When a subscriber's
    /// queue is full, the incoming value is dropped for that subscriber only.
    Bounded { capacity: usize },
}

impl BufferPolicy {
    /// Largest capacity a bounded buffer can have.
    pub const MAX_CAPACITY: usize = Semaphore::MAX_PERMITS;
}

/// Configuration for an [`ObservableValue`](super::ObservableValue).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueConfig {
    /// Which writes get broadcast.
    pub policy: Policy,

    /// Per-subscriber buffering.
    pub buffer: BufferPolicy,
}

impl ValueConfig {
    /// Set the broadcast policy.
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the per-subscriber buffering.
    pub fn buffer(mut self, buffer: BufferPolicy) -> Self {
        self.buffer = buffer;
        self
    }

    /// Check the configuration for values that cannot be honoured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.buffer {
            BufferPolicy::Bounded { capacity: 0 } => Err(ConfigError::ZeroCapacity),
            BufferPolicy::Bounded { capacity } if capacity > BufferPolicy::MAX_CAPACITY => {
                Err(ConfigError::CapacityTooLarge {
                    capacity,
                    max: BufferPolicy::MAX_CAPACITY,
                })
            }
            _ => Ok(()),
        }
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
