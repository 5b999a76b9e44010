//! Provenance: where a product came from and what it was derived from.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use edm_core::{ModuleDescription, ProductId};

use crate::product::TypeTag;

/// Static description of a product: creator, type and instance label.
///
/// This is the metadata a [`Selector`](crate::selector::Selector) filters on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescription {
    pub creator: ModuleDescription,
    pub type_name: String,
    pub friendly_name: String,
    pub instance_label: String,
}

impl ProductDescription {
    pub(crate) fn new(creator: ModuleDescription, tag: TypeTag, instance_label: String) -> Self {
        Self {
            creator,
            type_name: tag.name().to_string(),
            friendly_name: tag.friendly_name(),
            instance_label,
        }
    }

    pub fn module_label(&self) -> &str {
        &self.creator.module_label
    }

    pub fn process_name(&self) -> &str {
        &self.creator.process_name
    }

    pub fn instance_label(&self) -> &str {
        &self.instance_label
    }
}

/// Outcome recorded for a product's creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Success,
    /// Part of the record format for analysis tooling. The store never
    /// writes it: a discarded product gets no provenance, and the failed
    /// attempt is reported as `StoreEvent::Discarded` instead.
    Failed,
}

/// Immutable origin record of a stored product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    id: ProductId,
    description: ProductDescription,
    /// Products the creating module had read when it committed.
    parents: BTreeSet<ProductId>,
    status: ProductStatus,
}

impl Provenance {
    pub(crate) fn new(
        id: ProductId,
        description: ProductDescription,
        parents: BTreeSet<ProductId>,
        status: ProductStatus,
    ) -> Self {
        Self {
            id,
            description,
            parents,
            status,
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn description(&self) -> &ProductDescription {
        &self.description
    }

    pub fn creator(&self) -> &ModuleDescription {
        &self.description.creator
    }

    pub fn parents(&self) -> &BTreeSet<ProductId> {
        &self.parents
    }

    pub fn status(&self) -> ProductStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == ProductStatus::Success
    }
}
