//! Board configuration
//!
//! Loaded from TOML. Missing keys take their defaults; unknown keys are
//! rejected so typos do not silently fall back.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Task board configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    /// Remote collection holding the roster
    pub employees_collection: String,
    /// Remote collection holding groups
    pub groups_collection: String,
    /// Capacity of the inbound snapshot queue
    pub snapshot_buffer: usize,
    /// Restore the prior group record when an optimistic write fails
    pub rollback_on_write_failure: bool,
}

impl BoardConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With groups collection name
    #[inline]
    #[must_use]
    pub fn with_groups_collection(mut self, name: impl Into<String>) -> Self {
        self.groups_collection = name.into();
        self
    }

    /// With employees collection name
    #[inline]
    #[must_use]
    pub fn with_employees_collection(mut self, name: impl Into<String>) -> Self {
        self.employees_collection = name.into();
        self
    }

    /// With snapshot queue capacity
    #[inline]
    #[must_use]
    pub fn with_snapshot_buffer(mut self, capacity: usize) -> Self {
        self.snapshot_buffer = capacity;
        self
    }

    /// With rollback on write failure
    #[inline]
    #[must_use]
    pub fn with_rollback(mut self, enabled: bool) -> Self {
        self.rollback_on_write_failure = enabled;
        self
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_buffer == 0 {
            return Err(ConfigError::Invalid(
                "snapshot_buffer must be at least 1".to_string(),
            ));
        }
        if self.employees_collection.is_empty() || self.groups_collection.is_empty() {
            return Err(ConfigError::Invalid(
                "collection names cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            employees_collection: "employees".to_string(),
            groups_collection: "groups".to_string(),
            snapshot_buffer: 64,
            rollback_on_write_failure: false,
        }
    }
}
