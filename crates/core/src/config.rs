//! Process-level configuration.

use serde::{Deserialize, Serialize};

/// Process name used when `EDM_PROCESS_NAME` is not set.
pub const DEFAULT_PROCESS_NAME: &str = "RECO";

/// The processing pass a store (and every module in it) runs under.
///
/// The process name ends up in every product's provenance through the
/// module descriptions built from this config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub process_name: String,
    pub release: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            process_name: DEFAULT_PROCESS_NAME.to_string(),
            release: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ProcessConfig {
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
            ..Self::default()
        }
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = release.into();
        self
    }

    /// Read `EDM_PROCESS_NAME` and `EDM_RELEASE`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let process_name =
            std::env::var("EDM_PROCESS_NAME").unwrap_or_else(|_| defaults.process_name.clone());
        let release = std::env::var("EDM_RELEASE").unwrap_or(defaults.release);

        Self {
            process_name,
            release,
        }
    }
}
