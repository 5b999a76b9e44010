//! `edm-framework` — the per-event product store.
//!
//! Modules exchange typed products through an [`Event`] bound to the event's
//! [`ProductStore`]. A module's output becomes visible to later modules only
//! when its `Event` commits, all at once, and every committed product carries
//! a [`Provenance`] naming its creator and the products it was derived from.

pub mod event;
pub mod handle;
pub mod observer;
pub mod producer;
pub mod product;
pub mod provenance;
pub mod selector;
pub mod store;

pub use event::Event;
pub use handle::Handle;
pub use observer::{NoopObserver, RecordingObserver, StoreEvent, StoreObserver, TracingObserver};
pub use producer::{EdProducer, FnProducer, ModuleOutcome, run_module};
pub use product::{ProductEntry, TypeTag};
pub use provenance::{ProductDescription, ProductStatus, Provenance};
pub use selector::{
    AndSelector, InstanceLabelSelector, MatchAllSelector, ModuleLabelSelector, NotSelector,
    OrSelector, ProcessNameSelector, Selector,
};
pub use store::{ProductStore, StoreSnapshot};

pub use edm_core::{
    EventId, ModuleDescription, ProcessConfig, ProductId, StoreError, StoreResult, Timestamp,
};
