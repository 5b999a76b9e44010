//! Strongly-typed identifiers used by the product store.

use serde::{Deserialize, Serialize};

/// Identifier of a stored product, unique within one event's store.
///
/// Assigned by the store at insertion time, starting at 1 and never reused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    /// The first identifier a fresh store hands out.
    pub const FIRST: ProductId = ProductId(1);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The identifier following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ProductId> for u64 {
    fn from(value: ProductId) -> Self {
        value.0
    }
}

/// Identity of the unit of work (run number + event number).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId {
    run: u32,
    event: u64,
}

impl EventId {
    pub fn new(run: u32, event: u64) -> Self {
        Self { run, event }
    }

    pub fn run(&self) -> u32 {
        self.run
    }

    pub fn event(&self) -> u64 {
        self.event
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "run {} event {}", self.run, self.event)
    }
}
