//! aerograph - Schema resolution fan-out for a sharded, replicated graph store
//!
//! A request names predicates and the schema fields wanted for them. The
//! coordinator partitions it by owning group, resolves each part locally or
//! on the group leader, and merges the answers into one flat list.

pub mod cli;
pub mod cluster;
pub mod config;
pub mod context;
pub mod node;
pub mod observability;
pub mod schema;
pub mod worker;
