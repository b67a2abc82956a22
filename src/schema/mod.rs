//! Schema subsystem
//!
//! Wire types of the `Schema` call, the predicate catalog the worker reads,
//! and the local projection that turns catalog entries into schema nodes.
//!
//! # Design Principles
//!
//! - Read-only: nothing here defines or alters predicates
//! - Projection never fails; missing schema is an omission, not an error
//! - Deterministic field order for the default field set

mod catalog;
mod projector;
mod types;

pub use catalog::{MemoryCatalog, PredicateSchema, SchemaCatalog, TypeId};
pub use projector::LocalProjector;
pub use types::{SchemaField, SchemaNode, SchemaRequest, SchemaResult};
