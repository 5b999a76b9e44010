//! Typed, read-only view of a committed product.

use core::ops::Deref;

use edm_core::ProductId;

use crate::provenance::Provenance;

/// Borrowed handle to a stored product and its provenance.
pub struct Handle<'a, T> {
    product: &'a T,
    provenance: &'a Provenance,
}

impl<'a, T> Handle<'a, T> {
    pub(crate) fn new(product: &'a T, provenance: &'a Provenance) -> Self {
        Self {
            product,
            provenance,
        }
    }

    pub fn id(&self) -> ProductId {
        self.provenance.id()
    }

    pub fn product(&self) -> &'a T {
        self.product
    }

    pub fn provenance(&self) -> &'a Provenance {
        self.provenance
    }
}

impl<T> Clone for Handle<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<'_, T> {}

impl<T> Deref for Handle<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.product
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Handle<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id())
            .field("product", self.product)
            .finish()
    }
}
