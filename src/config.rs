//! Approval and backend capacity configuration

use crate::error::OrderError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for the approval gate and the backend batching ceiling. Both are
/// deployment configuration, never hardcoded into the decision logic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Orders strictly larger than this require a human decision.
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// Hard per-call ceiling of the image backend.
    #[serde(default = "default_cap")]
    pub cap: u32,
}

fn default_threshold() -> u32 {
    4
}

fn default_cap() -> u32 {
    4
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            cap: default_cap(),
        }
    }
}

impl ApprovalConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: ApprovalConfig =
            toml::from_str(&contents).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.threshold == 0 {
            return Err(
                OrderError::InvalidArgument("approval threshold must be positive".into()).into(),
            );
        }
        if self.cap == 0 {
            return Err(
                OrderError::InvalidArgument("backend capacity must be positive".into()).into(),
            );
        }
        Ok(())
    }
}
