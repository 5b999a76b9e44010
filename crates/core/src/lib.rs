//! `edm-core` — identifiers, module descriptions, configuration and the error
//! model shared by the product store.
//!
//! This crate holds plain data only; storage lives in `edm-framework`.

pub mod config;
pub mod error;
pub mod id;
pub mod module;
pub mod time;

pub use config::ProcessConfig;
pub use error::{StoreError, StoreResult};
pub use id::{EventId, ProductId};
pub use module::ModuleDescription;
pub use time::Timestamp;
