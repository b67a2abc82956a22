//! Request partitioning
//!
//! Splits a schema request into one sub-request per owning group. Ownership
//! is read once per predicate at partition time and never re-checked.

use std::collections::{BTreeMap, BTreeSet};

use crate::cluster::{GroupId, TopologyOracle, UNROUTED_GROUP};
use crate::schema::SchemaRequest;

/// Group id to the sub-request scoped to that group's predicates
///
/// Ordered so that a given request and topology snapshot always partition
/// and dispatch in the same order.
pub type SchemaMap = BTreeMap<GroupId, SchemaRequest>;

/// Partition `request` by owning group.
///
/// Named predicates go to the group that owns them; a predicate with no
/// known owner lands under `UNROUTED_GROUP`. A request naming no predicates
/// becomes one empty sub-request per known group, excluding `UNROUTED_GROUP`.
pub fn partition(topology: &dyn TopologyOracle, request: &SchemaRequest) -> SchemaMap {
    let mut schema_map = SchemaMap::new();
    let mut seen = BTreeSet::new();

    for predicate in &request.predicates {
        if !seen.insert(predicate.as_str()) {
            continue;
        }
        let group_id = topology.belongs_to(predicate);
        schema_map
            .entry(group_id)
            .or_insert_with(|| SchemaRequest::for_group(group_id, request.fields.clone()))
            .predicates
            .push(predicate.clone());
    }

    if !request.predicates.is_empty() {
        return schema_map;
    }

    for group_id in topology.known_groups() {
        if group_id == UNROUTED_GROUP {
            continue;
        }
        schema_map
            .entry(group_id)
            .or_insert_with(|| SchemaRequest::for_group(group_id, request.fields.clone()));
    }
    schema_map
}
