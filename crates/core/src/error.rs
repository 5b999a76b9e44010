//! Store error model.

use thiserror::Error;

/// Result type used across the product store.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error raised by product lookups, staging and commit.
///
/// `NotFound`, `Ambiguous` and `TypeMismatch` are ordinary outcomes handed back
/// to the calling module, which decides whether a missing product matters to
/// it. `DuplicateLabel` is a usage error in the module itself.
/// `InvariantViolation` means the store is inconsistent and processing of the
/// event must stop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No product matched the lookup key.
    #[error("product not found: {0}")]
    NotFound(String),

    /// More than one product matched where exactly one was required.
    #[error("ambiguous lookup for {type_name}: {matches} products matched")]
    Ambiguous {
        type_name: &'static str,
        matches: usize,
    },

    /// A module staged a product whose type and instance label are already
    /// taken, by its own output or by a product another module committed.
    #[error("duplicate label for {type_name}: module '{module_label}', instance '{instance_label}'")]
    DuplicateLabel {
        type_name: &'static str,
        module_label: String,
        instance_label: String,
    },

    /// The product exists but holds a different type than the one requested.
    #[error("type mismatch: requested {expected}, stored {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A store invariant was violated (id collision, dangling parent, ...).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl StoreError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Whether this error must terminate processing of the current event.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }

    /// Whether this error only reports that a lookup came back empty.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
