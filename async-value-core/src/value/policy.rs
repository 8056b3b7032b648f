//! Broadcast policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Decides which writes are broadcast to subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Broadcast every write, and replay the current value to new subscribers.
    #[default]
    #[serde(alias = "all")]
    AllValues,

    /// Broadcast only writes that differ from the immediately preceding
    /// value. New subscribers get no replay.
    #[serde(alias = "distinct")]
    DistinctValues,
}

impl Policy {
    /// Whether a write of `next` over `current` should be broadcast.
    ///
    /// `DistinctValues` compares against the value right before this write,
    /// not the last value broadcast, so A -> B -> A broadcasts both changes.
    pub fn accepts<V: PartialEq>(self, current: &V, next: &V) -> bool {
        match self {
            Policy::AllValues => true,
            Policy::DistinctValues => current != next,
        }
    }

    /// Whether new subscribers receive the current value first.
    pub fn replays_current(self) -> bool {
        matches!(self, Policy::AllValues)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::AllValues => write!(f, "all_values"),
            Policy::DistinctValues => write!(f, "distinct_values"),
        }
    }
}

impl FromStr for Policy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "all_values" => Ok(Policy::AllValues),
            "distinct" | "distinct_values" => Ok(Policy::DistinctValues),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}
