//! `Event`: one module's staging view over the product store.
//!
//! An `Event` is created right before a module runs and dropped right after.
//! While it lives it:
//!
//! - forwards every lookup to the [`ProductStore`] and remembers the ids it
//!   returned (the read-set),
//! - buffers the module's new products without touching the store,
//! - moves the buffered products into the store on [`Event::commit`].
//!
//! Dropping an `Event` without committing releases the staged products and
//! reports a [`StoreEvent::Discarded`] failed attempt. The store is left
//! exactly as it was.
//!
//! Holding `&mut ProductStore` makes the event the only writer for its
//! lifetime.
//!
//! Handles returned by the `get*` methods borrow the `Event`, not the store
//! behind it. A module cannot hold an input handle across [`Event::put`] or
//! [`Event::commit`]; it copies what it needs out of the handle first.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::BTreeSet;

use edm_core::{EventId, ModuleDescription, ProductId, StoreError, StoreResult, Timestamp};

use crate::handle::Handle;
use crate::observer::StoreEvent;
use crate::product::{ErasedProduct, TypeTag};
use crate::provenance::ProductDescription;
use crate::selector::Selector;
use crate::store::ProductStore;

/// A staged product waiting for commit.
struct StagedProduct {
    tag: TypeTag,
    instance_label: String,
    /// `None` once the product has been moved into the store.
    product: Option<ErasedProduct>,
}

/// Per-module staging context bound to one event's store.
pub struct Event<'s> {
    store: &'s mut ProductStore,
    module: ModuleDescription,
    staged: Vec<StagedProduct>,
    read: RefCell<BTreeSet<ProductId>>,
}

impl core::fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Event")
            .field("event_id", &self.store.id())
            .field("module", &self.module.module_label)
            .field("staged", &self.staged.len())
            .field("read", &self.read.borrow().len())
            .finish()
    }
}

impl<'s> Event<'s> {
    pub fn new(store: &'s mut ProductStore, module: ModuleDescription) -> Self {
        Self {
            store,
            module,
            staged: Vec::new(),
            read: RefCell::new(BTreeSet::new()),
        }
    }

    pub fn id(&self) -> EventId {
        self.store.id()
    }

    pub fn time(&self) -> Timestamp {
        self.store.time()
    }

    pub fn module(&self) -> &ModuleDescription {
        &self.module
    }

    /// Ids returned by lookups made through this event so far.
    pub fn read_set(&self) -> BTreeSet<ProductId> {
        self.read.borrow().clone()
    }

    /// Number of products waiting for commit.
    pub fn staged_len(&self) -> usize {
        self.staged.iter().filter(|s| s.product.is_some()).count()
    }

    pub fn get<T: Any>(&self, id: ProductId) -> StoreResult<Handle<'_, T>> {
        let handle = self.store.get::<T>(id)?;
        self.record(handle.id());
        Ok(handle)
    }

    pub fn get_by_selector<T, S>(&self, selector: &S) -> StoreResult<Handle<'_, T>>
    where
        T: Any,
        S: Selector + ?Sized,
    {
        let handle = self.store.get_by_selector::<T, S>(selector)?;
        self.record(handle.id());
        Ok(handle)
    }

    pub fn get_by_label<T: Any>(
        &self,
        module_label: &str,
        instance_label: &str,
    ) -> StoreResult<Handle<'_, T>> {
        let handle = self.store.get_by_label::<T>(module_label, instance_label)?;
        self.record(handle.id());
        Ok(handle)
    }

    pub fn get_many<T, S>(&self, selector: &S) -> StoreResult<Vec<Handle<'_, T>>>
    where
        T: Any,
        S: Selector + ?Sized,
    {
        let handles = self.store.get_many::<T, S>(selector)?;
        self.record_all(&handles);
        Ok(handles)
    }

    pub fn get_by_type<T: Any>(&self) -> StoreResult<Handle<'_, T>> {
        let handle = self.store.get_by_type::<T>()?;
        self.record(handle.id());
        Ok(handle)
    }

    pub fn get_many_by_type<T: Any>(&self) -> StoreResult<Vec<Handle<'_, T>>> {
        let handles = self.store.get_many_by_type::<T>()?;
        self.record_all(&handles);
        Ok(handles)
    }

    /// Stage `product` under `instance_label` for the next commit.
    ///
    /// The store is not touched. Products staged here are invisible to every
    /// lookup, including this module's own, until commit. Staging a second
    /// product of the same type with the same instance label fails with
    /// `DuplicateLabel`.
    pub fn put<T>(&mut self, product: T, instance_label: impl Into<String>) -> StoreResult<()>
    where
        T: Any + Send + Sync,
    {
        let instance_label = instance_label.into();
        let tag = TypeTag::of::<T>();
        let duplicate = self
            .staged
            .iter()
            .any(|s| s.tag.id() == TypeId::of::<T>() && s.instance_label == instance_label);
        if duplicate {
            return Err(StoreError::DuplicateLabel {
                type_name: tag.name(),
                module_label: self.module.module_label.clone(),
                instance_label,
            });
        }

        self.staged.push(StagedProduct {
            tag,
            instance_label,
            product: Some(ErasedProduct::new(product)),
        });
        Ok(())
    }

    /// Move every staged product into the store, in staging order.
    ///
    /// Every product gets the read-set as it stands now as its parents.
    /// A staged `(type, instance label)` already committed by any module,
    /// this one included, fails the whole batch with `DuplicateLabel` before
    /// anything is inserted. An `InvariantViolation` from the store is fatal
    /// for the event. Committing with nothing staged returns no ids.
    pub fn commit(&mut self) -> StoreResult<Vec<ProductId>> {
        let pending = self.staged.iter().filter(|s| s.product.is_some());
        for slot in pending {
            if self
                .store
                .instance_label_owner(slot.tag.id(), &slot.instance_label)
                .is_some()
            {
                return Err(StoreError::DuplicateLabel {
                    type_name: slot.tag.name(),
                    module_label: self.module.module_label.clone(),
                    instance_label: slot.instance_label.clone(),
                });
            }
        }

        let parents = self.read.borrow().clone();
        let mut ids = Vec::with_capacity(self.staged.len());
        for slot in self.staged.iter_mut() {
            let Some(product) = slot.product.take() else {
                continue;
            };
            let description = ProductDescription::new(
                self.module.clone(),
                slot.tag,
                slot.instance_label.clone(),
            );
            let id = self
                .store
                .insert(product, description, parents.clone())?;
            ids.push(id);
        }
        self.staged.clear();

        if !ids.is_empty() {
            self.store.observer().on_event(&StoreEvent::Committed {
                event: self.store.id(),
                module_label: self.module.module_label.clone(),
                products: ids.clone(),
            });
        }
        Ok(ids)
    }

    /// Drop the staged products without committing.
    pub fn discard(self) {}

    fn record(&self, id: ProductId) {
        self.read.borrow_mut().insert(id);
    }

    fn record_all<T>(&self, handles: &[Handle<'_, T>]) {
        self.read.borrow_mut().extend(handles.iter().map(Handle::id));
    }
}

impl Drop for Event<'_> {
    fn drop(&mut self) {
        let instance_labels: Vec<String> = self
            .staged
            .iter()
            .filter(|s| s.product.is_some())
            .map(|s| s.instance_label.clone())
            .collect();
        if instance_labels.is_empty() {
            return;
        }

        self.store.observer().on_event(&StoreEvent::Discarded {
            event: self.store.id(),
            module_label: self.module.module_label.clone(),
            instance_labels,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use edm_core::ProcessConfig;

    use super::*;
    use crate::observer::RecordingObserver;

    fn store_with(observer: Arc<RecordingObserver>) -> ProductStore {
        ProductStore::new(EventId::new(1, 7), Timestamp::default(), ProcessConfig::new("RECO"))
            .with_observer(observer)
    }

    fn module(label: &str) -> ModuleDescription {
        ModuleDescription::new(label, "TestProducer", &ProcessConfig::new("RECO"))
    }

    #[test]
    fn staged_products_are_invisible_until_commit() {
        let observer = Arc::new(RecordingObserver::new());
        let mut store = store_with(observer.clone());

        let mut event = Event::new(&mut store, module("m1"));
        event.put(5u32, "a").unwrap();
        assert!(event.get_by_label::<u32>("m1", "a").unwrap_err().is_not_found());
        assert_eq!(event.staged_len(), 1);

        let ids = event.commit().unwrap();
        assert_eq!(ids, vec![ProductId::FIRST]);
        assert_eq!(event.staged_len(), 0);
        drop(event);

        assert_eq!(*store.get::<u32>(ProductId::FIRST).unwrap(), 5);
        assert!(observer.discarded().is_empty());
    }

    #[test]
    fn duplicate_instance_label_is_rejected_per_type() {
        let mut store = store_with(Arc::new(RecordingObserver::new()));
        let mut event = Event::new(&mut store, module("m1"));

        event.put(1u32, "out").unwrap();
        event.put(1.0f64, "out").unwrap();
        let err = event.put(2u32, "out").unwrap_err();
        assert!(matches!(
            err,
            StoreError::DuplicateLabel { ref instance_label, .. } if instance_label == "out"
        ));
        assert_eq!(event.staged_len(), 2);
    }

    #[test]
    fn parents_are_the_read_set_at_commit() {
        let mut store = store_with(Arc::new(RecordingObserver::new()));
        let mut first = Event::new(&mut store, module("m1"));
        first.put(1u32, "a").unwrap();
        first.put(2u32, "b").unwrap();
        let ids = first.commit().unwrap();
        drop(first);

        let mut second = Event::new(&mut store, module("m2"));
        let a = *second.get::<u32>(ids[0]).unwrap();
        second.put(u64::from(a) * 10, "early").unwrap();
        let b = *second.get_by_label::<u32>("m1", "b").unwrap();
        second.put(u64::from(b) * 10, "late").unwrap();
        let out = second.commit().unwrap();
        drop(second);

        let read = BTreeSet::from([ids[0], ids[1]]);
        assert_eq!(store.get_provenance(out[0]).unwrap().parents(), &read);
        assert_eq!(store.get_provenance(out[1]).unwrap().parents(), &read);
    }

    #[test]
    fn read_after_put_still_becomes_a_parent() {
        let mut store = store_with(Arc::new(RecordingObserver::new()));
        let mut first = Event::new(&mut store, module("m1"));
        first.put(7u32, "a").unwrap();
        let a = first.commit().unwrap()[0];
        drop(first);

        let mut second = Event::new(&mut store, module("m2"));
        second.put(2u64, "c").unwrap();
        second.get::<u32>(a).unwrap();
        let c = second.commit().unwrap()[0];
        drop(second);

        assert_eq!(
            store.get_provenance(c).unwrap().parents(),
            &BTreeSet::from([a])
        );
    }

    #[test]
    fn instance_label_taken_by_another_module_collides_at_commit() {
        let observer = Arc::new(RecordingObserver::new());
        let mut store = store_with(observer.clone());
        let mut first = Event::new(&mut store, module("m1"));
        first.put(7u32, "raw").unwrap();
        first.commit().unwrap();
        drop(first);
        let before = store.snapshot();

        let mut second = Event::new(&mut store, module("m2"));
        second.put(7u64, "raw").unwrap();
        second.put(8u32, "raw").unwrap();
        let err = second.commit().unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateLabel {
                type_name: "u32",
                module_label: "m2".to_string(),
                instance_label: "raw".to_string(),
            }
        );
        assert_eq!(second.staged_len(), 2);
        drop(second);

        assert_eq!(store.snapshot(), before);
        assert_eq!(store.get_many_by_type::<u32>().unwrap().len(), 1);
        assert_eq!(observer.discarded().len(), 1);
    }

    #[test]
    fn dropping_without_commit_records_a_failed_attempt() {
        let observer = Arc::new(RecordingObserver::new());
        let mut store = store_with(observer.clone());
        let before = store.snapshot();

        let mut event = Event::new(&mut store, module("m3"));
        event.put(String::from("partial"), "x").unwrap();
        event.discard();

        assert_eq!(store.snapshot(), before);
        assert_eq!(
            observer.discarded(),
            vec![StoreEvent::Discarded {
                event: EventId::new(1, 7),
                module_label: "m3".to_string(),
                instance_labels: vec!["x".to_string()],
            }]
        );
    }

    #[test]
    fn empty_commit_is_a_no_op() {
        let observer = Arc::new(RecordingObserver::new());
        let mut store = store_with(observer.clone());
        let mut event = Event::new(&mut store, module("m1"));
        assert!(event.commit().unwrap().is_empty());
        assert!(event.commit().unwrap().is_empty());
        drop(event);
        assert!(store.is_empty());
        assert!(observer.events().is_empty());
    }

    #[test]
    fn rerunning_a_module_collides_at_commit() {
        let mut store = store_with(Arc::new(RecordingObserver::new()));
        let mut first = Event::new(&mut store, module("m1"));
        first.put(1u32, "a").unwrap();
        first.commit().unwrap();
        drop(first);
        let before = store.snapshot();

        let mut again = Event::new(&mut store, module("m1"));
        again.put(7u8, "other").unwrap();
        again.put(2u32, "a").unwrap();
        let err = again.commit().unwrap_err();
        assert!(matches!(err, StoreError::DuplicateLabel { .. }));
        assert!(!err.is_fatal());
        drop(again);

        assert_eq!(store.snapshot(), before);
    }
}
