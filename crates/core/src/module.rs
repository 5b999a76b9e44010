//! Module descriptions: who created a product.

use serde::{Deserialize, Serialize};

use crate::config::ProcessConfig;

/// Identity of a processing module as recorded in provenance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleDescription {
    /// Label the module was configured under (unique within a process).
    pub module_label: String,
    /// Name of the module's implementation.
    pub module_class: String,
    pub process_name: String,
    pub release: String,
}

impl ModuleDescription {
    pub fn new(
        module_label: impl Into<String>,
        module_class: impl Into<String>,
        process: &ProcessConfig,
    ) -> Self {
        Self {
            module_label: module_label.into(),
            module_class: module_class.into(),
            process_name: process.process_name.clone(),
            release: process.release.clone(),
        }
    }

    pub fn label(&self) -> &str {
        &self.module_label
    }
}

impl core::fmt::Display for ModuleDescription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}:{} ({})",
            self.process_name, self.module_label, self.module_class
        )
    }
}
