//! Injected observability sink for store activity.
//!
//! The store and its staging contexts report what happens to products through
//! a [`StoreObserver`] handed to the store at construction, instead of logging
//! through a process-wide singleton. [`TracingObserver`] (the default) forwards
//! to `tracing`; [`RecordingObserver`] keeps events in memory for tests.

use std::sync::Mutex;

use edm_core::{EventId, ProductId};

/// Something that happened to the products of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A product was inserted into the store.
    ProductInserted {
        event: EventId,
        id: ProductId,
        type_name: String,
        module_label: String,
        instance_label: String,
        parents: usize,
    },
    /// A module's staged products were committed.
    Committed {
        event: EventId,
        module_label: String,
        products: Vec<ProductId>,
    },
    /// A staging context was dropped with uncommitted products.
    ///
    /// This is the failed-attempt record: the listed products were released
    /// and never became visible.
    Discarded {
        event: EventId,
        module_label: String,
        instance_labels: Vec<String>,
    },
    /// A module returned an error instead of completing.
    ModuleFailed {
        event: EventId,
        module_label: String,
        reason: String,
    },
}

/// Receiver of [`StoreEvent`]s.
pub trait StoreObserver: Send + Sync {
    fn on_event(&self, event: &StoreEvent);
}

/// Forwards store events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StoreObserver for TracingObserver {
    fn on_event(&self, event: &StoreEvent) {
        match event {
            StoreEvent::ProductInserted {
                event,
                id,
                type_name,
                module_label,
                instance_label,
                parents,
            } => tracing::trace!(
                event = %event,
                product = %id,
                type_name = %type_name,
                module = %module_label,
                instance = %instance_label,
                parents,
                "product inserted"
            ),
            StoreEvent::Committed {
                event,
                module_label,
                products,
            } => tracing::debug!(
                event = %event,
                module = %module_label,
                count = products.len(),
                "module output committed"
            ),
            StoreEvent::Discarded {
                event,
                module_label,
                instance_labels,
            } => tracing::warn!(
                event = %event,
                module = %module_label,
                instances = ?instance_labels,
                "uncommitted products discarded"
            ),
            StoreEvent::ModuleFailed {
                event,
                module_label,
                reason,
            } => tracing::warn!(
                event = %event,
                module = %module_label,
                error = %reason,
                "module failed"
            ),
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StoreObserver for NoopObserver {
    fn on_event(&self, _event: &StoreEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<StoreEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, oldest first.
    pub fn events(&self) -> Vec<StoreEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Only the failed-attempt records.
    pub fn discarded(&self) -> Vec<StoreEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, StoreEvent::Discarded { .. }))
            .collect()
    }
}

impl StoreObserver for RecordingObserver {
    fn on_event(&self, event: &StoreEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}
