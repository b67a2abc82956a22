//! Cluster collaborators
//!
//! Narrow interfaces to the parts of the cluster the schema fan-out path
//! consults but does not own:
//! - Topology: group ownership, membership and leadership
//! - Health: process readiness
//! - Transport: the forwarded `Schema` call to a group leader
//!
//! All are injected as `Arc<dyn Trait>` and read-only from the fan-out path.

mod health;
mod topology;
mod transport;

pub use health::{HealthCheck, HealthFlag};
pub use topology::{GroupId, StaticTopology, TopologyOracle, UNROUTED_GROUP};
pub use transport::{SchemaFuture, WorkerClient};
