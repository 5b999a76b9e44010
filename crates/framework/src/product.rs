//! Type-erased product storage.
//!
//! Products are values of unrelated, module-defined types. The store keeps
//! them behind `Box<dyn Any + Send + Sync>` next to a [`TypeTag`] so lookups
//! can be indexed by runtime type and retrieval can be checked.

use std::any::{Any, TypeId, type_name};

use edm_core::{StoreError, StoreResult};

use crate::provenance::Provenance;

/// Runtime type tag of a product.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, e.g. `alloc::vec::Vec<reco::Track>`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with module paths stripped, e.g. `Vec<Track>`.
    pub fn friendly_name(&self) -> String {
        friendly_name(self.name)
    }
}

fn friendly_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut token = String::new();
    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            token.push(c);
        } else {
            push_last_segment(&mut out, &token);
            token.clear();
            out.push(c);
        }
    }
    push_last_segment(&mut out, &token);
    out
}

fn push_last_segment(out: &mut String, path: &str) {
    out.push_str(path.rsplit("::").next().unwrap_or(path));
}

/// An owned product whose concrete type is only known at runtime.
pub(crate) struct ErasedProduct {
    tag: TypeTag,
    value: Box<dyn Any + Send + Sync>,
}

impl ErasedProduct {
    pub(crate) fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            tag: TypeTag::of::<T>(),
            value: Box::new(value),
        }
    }

    pub(crate) fn tag(&self) -> TypeTag {
        self.tag
    }

    pub(crate) fn downcast_ref<T: Any>(&self) -> StoreResult<&T> {
        self.value
            .as_ref()
            .downcast_ref::<T>()
            .ok_or(StoreError::TypeMismatch {
                expected: type_name::<T>(),
                found: self.tag.name,
            })
    }
}

impl core::fmt::Debug for ErasedProduct {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ErasedProduct")
            .field("type", &self.tag.name)
            .finish_non_exhaustive()
    }
}

/// A committed product together with its provenance.
///
/// Entries are created by the store during commit and never change
/// afterwards.
#[derive(Debug)]
pub struct ProductEntry {
    product: ErasedProduct,
    provenance: Provenance,
}

impl ProductEntry {
    pub(crate) fn new(product: ErasedProduct, provenance: Provenance) -> Self {
        Self {
            product,
            provenance,
        }
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn type_tag(&self) -> TypeTag {
        self.product.tag()
    }

    /// Borrow the product as `T`, failing with `TypeMismatch` otherwise.
    pub fn product<T: Any>(&self) -> StoreResult<&T> {
        self.product.downcast_ref::<T>()
    }
}
