//! Cluster topology
//!
//! The topology oracle answers ownership and leadership questions from a
//! snapshot of cluster membership. The fan-out path only reads it.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::transport::WorkerClient;

/// Shard group identifier
pub type GroupId = u32;

/// Reserved group id: no owning group, or membership not yet known
pub const UNROUTED_GROUP: GroupId = 0;

/// Read-only view of cluster membership
pub trait TopologyOracle: Send + Sync {
    /// Check if this node is a member of `group_id`
    fn serves_group(&self, group_id: GroupId) -> bool;

    /// Group currently owning `predicate`, or `UNROUTED_GROUP` if unknown
    fn belongs_to(&self, predicate: &str) -> GroupId;

    /// Every group id in the membership snapshot
    fn known_groups(&self) -> Vec<GroupId>;

    /// Connection to the current leader of `group_id`
    fn leader(&self, group_id: GroupId) -> Option<Arc<dyn WorkerClient>>;

    /// Check if this node serves the tablet of `predicate`
    fn serves_tablet(&self, predicate: &str) -> bool {
        let group_id = self.belongs_to(predicate);
        group_id != UNROUTED_GROUP && self.serves_group(group_id)
    }
}

#[derive(Default)]
struct TopologyState {
    local_groups: BTreeSet<GroupId>,
    groups: BTreeSet<GroupId>,
    tablets: HashMap<String, GroupId>,
    leaders: HashMap<GroupId, Arc<dyn WorkerClient>>,
}

/// In-memory membership snapshot
///
/// Mutators exist so tests and the CLI can model tablet moves and leader
/// changes; the fan-out path only calls the `TopologyOracle` methods.
#[derive(Default)]
pub struct StaticTopology {
    state: RwLock<TopologyState>,
}

impl StaticTopology {
    /// Create an empty topology
    pub fn new() -> Self {
        Self::default()
    }

    // Each mutation is a single insert or remove, so a poisoned snapshot is
    // still consistent and stays in use.
    fn read(&self) -> RwLockReadGuard<'_, TopologyState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TopologyState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `group_id` as served by this node
    pub fn serve_group(&self, group_id: GroupId) {
        let mut state = self.write();
        state.local_groups.insert(group_id);
        state.groups.insert(group_id);
    }

    /// Add a group to the membership snapshot without serving it
    pub fn add_group(&self, group_id: GroupId) {
        let mut state = self.write();
        state.groups.insert(group_id);
    }

    /// Record that `group_id` owns the tablet of `predicate`
    pub fn assign_tablet(&self, predicate: impl Into<String>, group_id: GroupId) {
        let mut state = self.write();
        if group_id != UNROUTED_GROUP {
            state.groups.insert(group_id);
        }
        state.tablets.insert(predicate.into(), group_id);
    }

    /// Set the leader connection for `group_id`
    pub fn set_leader(&self, group_id: GroupId, client: Arc<dyn WorkerClient>) {
        let mut state = self.write();
        state.groups.insert(group_id);
        state.leaders.insert(group_id, client);
    }

    /// Drop the leader connection for `group_id`
    pub fn clear_leader(&self, group_id: GroupId) {
        let mut state = self.write();
        state.leaders.remove(&group_id);
    }

    /// Groups this node serves, ascending
    pub fn local_groups(&self) -> Vec<GroupId> {
        self.read().local_groups.iter().copied().collect()
    }
}

impl TopologyOracle for StaticTopology {
    fn serves_group(&self, group_id: GroupId) -> bool {
        self.read().local_groups.contains(&group_id)
    }

    fn belongs_to(&self, predicate: &str) -> GroupId {
        self.read()
            .tablets
            .get(predicate)
            .copied()
            .unwrap_or(UNROUTED_GROUP)
    }

    fn known_groups(&self) -> Vec<GroupId> {
        self.read().groups.iter().copied().collect()
    }

    fn leader(&self, group_id: GroupId) -> Option<Arc<dyn WorkerClient>> {
        self.read().leaders.get(&group_id).cloned()
    }
}
