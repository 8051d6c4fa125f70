//! Engine configuration

use crate::types::DEFAULT_ELIGIBILITY_CAPACITY;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("eligibility capacity must be at least 1")]
    ZeroCapacity,
    #[error("approval window must be positive (omit it to disable expiry)")]
    ZeroWindow,
}

/// How the round leader is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Uniform draw from the local RNG (nodes may disagree)
    #[default]
    Random,
    /// Draw keyed by a shared seed (all nodes agree)
    Seeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of recent unique senders eligible to propose
    pub eligibility_capacity: usize,
    /// Approval token lifetime; None = tokens never expire
    pub approval_window_secs: Option<u64>,
    pub selection: SelectionMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            eligibility_capacity: DEFAULT_ELIGIBILITY_CAPACITY,
            approval_window_secs: None,
            selection: SelectionMode::Random,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.eligibility_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.approval_window_secs == Some(0) {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(())
    }
}
