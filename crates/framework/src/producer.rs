//! Boundary with the module scheduler.
//!
//! The scheduler itself (which module runs when) lives outside this crate.
//! What it needs from the store is the per-module transaction:
//!
//! ```text
//! Event::new(store, module) → module.produce(&mut event) → commit | discard
//! ```
//!
//! [`run_module`] implements exactly that and nothing more.

use std::sync::Arc;

use edm_core::{ModuleDescription, ProductId, StoreError, StoreResult};

use crate::event::Event;
use crate::observer::StoreEvent;
use crate::store::ProductStore;

/// A processing module that reads products and stages new ones.
///
/// Module failures are arbitrary errors; the store only cares whether the
/// module completed.
pub trait EdProducer {
    fn description(&self) -> &ModuleDescription;

    fn produce(&mut self, event: &mut Event<'_>) -> anyhow::Result<()>;
}

/// Wraps a closure as an [`EdProducer`].
pub struct FnProducer<F> {
    description: ModuleDescription,
    produce: F,
}

impl<F> FnProducer<F>
where
    F: FnMut(&mut Event<'_>) -> anyhow::Result<()>,
{
    pub fn new(description: ModuleDescription, produce: F) -> Self {
        Self {
            description,
            produce,
        }
    }
}

impl<F> EdProducer for FnProducer<F>
where
    F: FnMut(&mut Event<'_>) -> anyhow::Result<()>,
{
    fn description(&self) -> &ModuleDescription {
        &self.description
    }

    fn produce(&mut self, event: &mut Event<'_>) -> anyhow::Result<()> {
        (self.produce)(event)
    }
}

/// What became of one module's run.
#[derive(Debug)]
pub enum ModuleOutcome {
    /// The module completed and its products were committed, in staging order.
    Committed(Vec<ProductId>),
    /// The module failed, or its output was rejected at commit. Nothing it
    /// staged reached the store.
    Failed(anyhow::Error),
}

impl ModuleOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, ModuleOutcome::Committed(_))
    }

    pub fn committed_ids(&self) -> &[ProductId] {
        match self {
            ModuleOutcome::Committed(ids) => ids,
            ModuleOutcome::Failed(_) => &[],
        }
    }
}

/// Run one module against `store`: commit on success, discard on failure.
///
/// Ordinary module failures and label collisions at commit come back as
/// `Ok(ModuleOutcome::Failed(..))` and the store is left as it was. Only a
/// fatal store error (`InvariantViolation`) is returned as `Err`; processing
/// of the event must stop.
pub fn run_module<P>(store: &mut ProductStore, producer: &mut P) -> StoreResult<ModuleOutcome>
where
    P: EdProducer + ?Sized,
{
    let observer = Arc::clone(store.observer());
    let event_id = store.id();
    let module = producer.description().clone();
    let module_label = module.module_label.clone();

    let mut event = Event::new(store, module);
    let failure = match producer.produce(&mut event) {
        Ok(()) => match event.commit() {
            Ok(ids) => return Ok(ModuleOutcome::Committed(ids)),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => anyhow::Error::from(err),
        },
        Err(err) => {
            if let Some(store_err) = err.downcast_ref::<StoreError>()
                && store_err.is_fatal()
            {
                return Err(store_err.clone());
            }
            err
        }
    };
    event.discard();

    observer.on_event(&StoreEvent::ModuleFailed {
        event: event_id,
        module_label,
        reason: format!("{failure:#}"),
    });
    Ok(ModuleOutcome::Failed(failure))
}
