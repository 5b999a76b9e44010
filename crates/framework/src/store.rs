//! The per-event product store.
//!
//! One [`ProductStore`] exists per unit of work. It owns every committed
//! [`ProductEntry`] and indexes them three ways:
//!
//! - by [`ProductId`] (exact lookup),
//! - by runtime type (for selector scans, in insertion order),
//! - by `(type, module label, instance label)` (label lookup),
//! - by `(type, instance label)`, which holds at most one product whichever
//!   module made it.
//!
//! The store only grows. Entries are added by a committing
//! [`Event`](crate::event::Event) and are never mutated or removed, which is
//! what makes `&ProductStore` safe to share between reader threads once the
//! module sequence is done.

use std::any::{Any, TypeId, type_name};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use edm_core::{EventId, ProcessConfig, ProductId, StoreError, StoreResult, Timestamp};

use crate::handle::Handle;
use crate::observer::{StoreEvent, StoreObserver, TracingObserver};
use crate::product::{ErasedProduct, ProductEntry};
use crate::provenance::{ProductDescription, ProductStatus, Provenance};
use crate::selector::{MatchAllSelector, Selector};

/// Key of a product in the label index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LabelKey {
    type_id: TypeId,
    module_label: String,
    instance_label: String,
}

impl LabelKey {
    fn new(type_id: TypeId, module_label: &str, instance_label: &str) -> Self {
        Self {
            type_id,
            module_label: module_label.to_string(),
            instance_label: instance_label.to_string(),
        }
    }
}

/// Append-only store of the products of one event.
pub struct ProductStore {
    event_id: EventId,
    time: Timestamp,
    process: ProcessConfig,

    /// Committed entries in insertion order.
    entries: Vec<ProductEntry>,
    by_id: HashMap<ProductId, usize>,
    by_type: HashMap<TypeId, Vec<usize>>,
    by_label: HashMap<LabelKey, usize>,
    /// `(type, instance label)` is unique across modules.
    by_instance: HashMap<(TypeId, String), usize>,
    next_id: ProductId,

    observer: Arc<dyn StoreObserver>,
}

// Manual `Debug`: products are type-erased and the observer is a trait object.
impl core::fmt::Debug for ProductStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProductStore")
            .field("event_id", &self.event_id)
            .field("process", &self.process.process_name)
            .field("products", &self.entries.len())
            .finish()
    }
}

impl ProductStore {
    pub fn new(event_id: EventId, time: Timestamp, process: ProcessConfig) -> Self {
        Self {
            event_id,
            time,
            process,
            entries: Vec::new(),
            by_id: HashMap::new(),
            by_type: HashMap::new(),
            by_label: HashMap::new(),
            by_instance: HashMap::new(),
            next_id: ProductId::FIRST,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the observer that receives this store's events.
    pub fn with_observer(mut self, observer: Arc<dyn StoreObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn id(&self) -> EventId {
        self.event_id
    }

    pub fn time(&self) -> Timestamp {
        self.time
    }

    pub fn process(&self) -> &ProcessConfig {
        &self.process
    }

    pub(crate) fn observer(&self) -> &Arc<dyn StoreObserver> {
        &self.observer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Committed entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &ProductEntry> {
        self.entries.iter()
    }

    /// Exact lookup by identifier.
    pub fn get<T: Any>(&self, id: ProductId) -> StoreResult<Handle<'_, T>> {
        let pos = self
            .by_id
            .get(&id)
            .copied()
            .ok_or_else(|| StoreError::not_found(format!("no product with id {id}")))?;
        self.handle_at(pos)
    }

    /// The unique product of type `T` accepted by `selector`.
    ///
    /// Fails with `NotFound` when nothing matches and `Ambiguous` when more
    /// than one product does.
    pub fn get_by_selector<T, S>(&self, selector: &S) -> StoreResult<Handle<'_, T>>
    where
        T: Any,
        S: Selector + ?Sized,
    {
        let matches = self.matching_positions::<T, S>(selector);
        match matches.as_slice() {
            [] => Err(StoreError::not_found(format!(
                "no {} matched the selector",
                type_name::<T>()
            ))),
            [pos] => self.handle_at(*pos),
            many => Err(StoreError::Ambiguous {
                type_name: type_name::<T>(),
                matches: many.len(),
            }),
        }
    }

    /// Lookup by creating module label and instance label.
    pub fn get_by_label<T: Any>(
        &self,
        module_label: &str,
        instance_label: &str,
    ) -> StoreResult<Handle<'_, T>> {
        let key = LabelKey::new(TypeId::of::<T>(), module_label, instance_label);
        let pos = self.by_label.get(&key).copied().ok_or_else(|| {
            StoreError::not_found(format!(
                "no {} labelled '{module_label}:{instance_label}'",
                type_name::<T>()
            ))
        })?;
        self.handle_at(pos)
    }

    /// Every product of type `T` accepted by `selector`, in insertion order.
    pub fn get_many<T, S>(&self, selector: &S) -> StoreResult<Vec<Handle<'_, T>>>
    where
        T: Any,
        S: Selector + ?Sized,
    {
        self.matching_positions::<T, S>(selector)
            .into_iter()
            .map(|pos| self.handle_at(pos))
            .collect()
    }

    /// The unique product of type `T`, whoever made it.
    pub fn get_by_type<T: Any>(&self) -> StoreResult<Handle<'_, T>> {
        self.get_by_selector::<T, _>(&MatchAllSelector)
    }

    /// Every product of type `T`, in insertion order.
    pub fn get_many_by_type<T: Any>(&self) -> StoreResult<Vec<Handle<'_, T>>> {
        self.get_many::<T, _>(&MatchAllSelector)
    }

    pub fn get_provenance(&self, id: ProductId) -> StoreResult<&Provenance> {
        self.by_id
            .get(&id)
            .map(|&pos| self.entries[pos].provenance())
            .ok_or_else(|| StoreError::not_found(format!("no provenance for id {id}")))
    }

    /// Provenance of every committed product, in insertion order.
    pub fn get_all_provenance(&self) -> Vec<&Provenance> {
        self.entries.iter().map(ProductEntry::provenance).collect()
    }

    /// Comparable summary of the store's full content and indices.
    pub fn snapshot(&self) -> StoreSnapshot {
        let mut by_type: Vec<(String, Vec<ProductId>)> = self
            .by_type
            .values()
            .filter_map(|positions| {
                let first = *positions.first()?;
                let type_name = self.entries[first].type_tag().name().to_string();
                let ids = positions
                    .iter()
                    .map(|&p| self.entries[p].provenance().id())
                    .collect();
                Some((type_name, ids))
            })
            .collect();
        by_type.sort();

        let mut labels: Vec<(String, String, String, ProductId)> = self
            .by_label
            .iter()
            .map(|(key, &pos)| {
                let entry = &self.entries[pos];
                (
                    entry.type_tag().name().to_string(),
                    key.module_label.clone(),
                    key.instance_label.clone(),
                    entry.provenance().id(),
                )
            })
            .collect();
        labels.sort();

        StoreSnapshot {
            event_id: self.event_id,
            next_id: self.next_id,
            provenance: self.entries.iter().map(|e| e.provenance().clone()).collect(),
            by_type,
            labels,
        }
    }

    /// The committed product of `type_id` under `instance_label`, if any.
    pub(crate) fn instance_label_owner(
        &self,
        type_id: TypeId,
        instance_label: &str,
    ) -> Option<&ProductDescription> {
        self.by_instance
            .get(&(type_id, instance_label.to_string()))
            .map(|&pos| self.entries[pos].provenance().description())
    }

    /// Insert one product, assigning it a fresh identifier.
    ///
    /// Only a committing `Event` calls this. Every check runs before any index
    /// is touched, so a rejected insert leaves the store unchanged. All
    /// failures are `InvariantViolation`s: the caller is expected to have
    /// validated labels already, and parents come from this store.
    pub(crate) fn insert(
        &mut self,
        product: ErasedProduct,
        description: ProductDescription,
        parents: BTreeSet<ProductId>,
    ) -> StoreResult<ProductId> {
        let id = self.next_id;
        if self.by_id.contains_key(&id) {
            return Err(StoreError::invariant(format!(
                "product id {id} already assigned"
            )));
        }

        if let Some(missing) = parents.iter().find(|p| !self.by_id.contains_key(*p)) {
            return Err(StoreError::invariant(format!(
                "parent {missing} of new product {id} is not in the store"
            )));
        }

        let tag = product.tag();
        let key = LabelKey::new(
            tag.id(),
            description.module_label(),
            description.instance_label(),
        );
        let instance_key = (tag.id(), key.instance_label.clone());
        if self.by_label.contains_key(&key) || self.by_instance.contains_key(&instance_key) {
            return Err(StoreError::invariant(format!(
                "instance label '{}' for {} already taken",
                key.instance_label,
                tag.name()
            )));
        }

        let parent_count = parents.len();
        let observed = StoreEvent::ProductInserted {
            event: self.event_id,
            id,
            type_name: tag.name().to_string(),
            module_label: key.module_label.clone(),
            instance_label: key.instance_label.clone(),
            parents: parent_count,
        };

        let pos = self.entries.len();
        let provenance = Provenance::new(id, description, parents, ProductStatus::Success);
        self.entries.push(ProductEntry::new(product, provenance));
        self.by_id.insert(id, pos);
        self.by_type.entry(tag.id()).or_default().push(pos);
        self.by_label.insert(key, pos);
        self.by_instance.insert(instance_key, pos);
        self.next_id = id.next();

        self.observer.on_event(&observed);
        Ok(id)
    }

    fn matching_positions<T, S>(&self, selector: &S) -> Vec<usize>
    where
        T: Any,
        S: Selector + ?Sized,
    {
        self.by_type
            .get(&TypeId::of::<T>())
            .map(|positions| {
                positions
                    .iter()
                    .copied()
                    .filter(|&pos| selector.matches(self.entries[pos].provenance().description()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn handle_at<T: Any>(&self, pos: usize) -> StoreResult<Handle<'_, T>> {
        let entry = &self.entries[pos];
        let product = entry.product::<T>()?;
        Ok(Handle::new(product, entry.provenance()))
    }
}

/// Point-in-time summary of a store, used to check that discarded modules
/// leave no trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub event_id: EventId,
    pub next_id: ProductId,
    pub provenance: Vec<Provenance>,
    /// `(type name, ids)` per type index bucket, sorted.
    pub by_type: Vec<(String, Vec<ProductId>)>,
    /// `(type name, module label, instance label, id)`, sorted.
    pub labels: Vec<(String, String, String, ProductId)>,
}
