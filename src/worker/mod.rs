//! Worker subsystem: schema resolution fan-out
//!
//! - Partitioner: groups requested predicates by owning shard group
//! - Coordinator: one concurrent lookup per group, local or forwarded to the
//!   group leader, aggregated fail-fast under caller cancellation
//! - Service: inbound handler for sub-requests forwarded by peers
//!
//! # Failure model
//!
//! - The first error observed fails the whole call
//! - Nothing is retried here; a stale leadership view fails the call and the
//!   caller retries
//! - Cancellation is observed by the aggregator only; dispatched lookups run
//!   to completion and their late results are discarded

mod coordinator;
mod errors;
mod partition;
mod service;

pub use coordinator::SchemaCoordinator;
pub use errors::{WorkerError, WorkerResult};
pub use partition::{partition, SchemaMap};
pub use service::WorkerService;
