//! Node assembly and in-process clusters
//!
//! A `Node` wires one topology view, catalog, health flag, coordinator and
//! worker service together. A `LocalCluster` builds several nodes from a
//! `ClusterFile` and connects each to the others' services as group leaders,
//! which stands in for the network transport.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cluster::{
    GroupId, HealthFlag, StaticTopology, TopologyOracle, WorkerClient, UNROUTED_GROUP,
};
use crate::config::{ConfigError, ConfigResult, CoordinatorConfig};
use crate::observability::{log_event, Event, FanoutMetrics};
use crate::schema::{LocalProjector, MemoryCatalog, PredicateSchema, SchemaNode, SchemaRequest};
use crate::worker::{SchemaCoordinator, WorkerResult, WorkerService};

/// Identity of a node in a cluster description
pub type NodeId = u64;

/// One node's components
pub struct Node {
    pub id: NodeId,
    pub topology: Arc<StaticTopology>,
    pub catalog: Arc<MemoryCatalog>,
    pub health: Arc<HealthFlag>,
    pub coordinator: SchemaCoordinator,
    pub service: Arc<WorkerService>,
}

impl Node {
    /// Assemble a node with empty topology and catalog, ready to serve
    pub fn new(id: NodeId, config: CoordinatorConfig) -> Self {
        let topology = Arc::new(StaticTopology::new());
        let catalog = Arc::new(MemoryCatalog::new());
        let health = Arc::new(HealthFlag::ready());
        let metrics = Arc::new(FanoutMetrics::new());

        let projector = Arc::new(LocalProjector::new(catalog.clone(), topology.clone()));
        let coordinator = SchemaCoordinator::new(topology.clone(), projector.clone(), health.clone())
            .with_config(CoordinatorConfig {
                node_id: id,
                ..config
            })
            .with_metrics(metrics.clone());
        let service =
            Arc::new(WorkerService::new(topology.clone(), projector).with_metrics(metrics));

        Self {
            id,
            topology,
            catalog,
            health,
            coordinator,
            service,
        }
    }

    /// Resolve `request` from this node with a context carrying the
    /// configured timeout
    pub async fn describe(&self, request: &SchemaRequest) -> WorkerResult<Vec<SchemaNode>> {
        let ctx = self.coordinator.context();
        self.coordinator.resolve_schema_over_network(&ctx, request).await
    }
}

fn default_ready() -> bool {
    true
}

/// A node in a cluster description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: NodeId,

    /// Groups this node is a member of
    #[serde(default)]
    pub groups: Vec<GroupId>,

    /// Whether the node passes its health check (default: true)
    #[serde(default = "default_ready")]
    pub ready: bool,
}

/// A predicate, its owning group and its schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateEntry {
    /// Owning group; 0 models a predicate whose owner is unknown
    pub group: GroupId,

    #[serde(flatten)]
    pub schema: PredicateSchema,
}

/// JSON description of an in-process cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterFile {
    pub nodes: Vec<NodeEntry>,

    /// Group leader overrides; by default the lowest member id leads
    #[serde(default)]
    pub leaders: BTreeMap<GroupId, NodeId>,

    #[serde(default)]
    pub predicates: BTreeMap<String, PredicateEntry>,
}

/// Per-group summary of a cluster description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLayout {
    pub group_id: GroupId,
    pub members: Vec<NodeId>,
    pub leader: Option<NodeId>,
    pub predicates: Vec<String>,
}

impl ClusterFile {
    /// Load and validate a cluster description from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a cluster description
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let cluster_file: ClusterFile = serde_json::from_str(content)?;
        cluster_file.validate()?;
        Ok(cluster_file)
    }

    /// Validate node identities, memberships and leader overrides
    pub fn validate(&self) -> ConfigResult<()> {
        if self.nodes.is_empty() {
            return Err(ConfigError::Invalid("cluster has no nodes".to_string()));
        }

        let mut ids = BTreeSet::new();
        for node in &self.nodes {
            if node.id == 0 {
                return Err(ConfigError::Invalid("node id must be > 0".to_string()));
            }
            if !ids.insert(node.id) {
                return Err(ConfigError::Invalid(format!("duplicate node id {}", node.id)));
            }
            if node.groups.contains(&UNROUTED_GROUP) {
                return Err(ConfigError::Invalid(format!(
                    "node {} cannot be a member of group {}",
                    node.id, UNROUTED_GROUP
                )));
            }
        }

        for (group_id, leader) in &self.leaders {
            let serves = self
                .nodes
                .iter()
                .any(|n| n.id == *leader && n.groups.contains(group_id));
            if !serves {
                return Err(ConfigError::Invalid(format!(
                    "leader {} of group {} is not a member of that group",
                    leader, group_id
                )));
            }
        }
        Ok(())
    }

    /// Every group some node is a member of, ascending
    pub fn groups(&self) -> BTreeSet<GroupId> {
        self.nodes
            .iter()
            .flat_map(|n| n.groups.iter().copied())
            .collect()
    }

    /// Members of `group_id`, ascending
    pub fn members(&self, group_id: GroupId) -> Vec<NodeId> {
        let mut members: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| n.groups.contains(&group_id))
            .map(|n| n.id)
            .collect();
        members.sort_unstable();
        members
    }

    /// Leader of `group_id`: the override, else the lowest member id
    pub fn leader(&self, group_id: GroupId) -> Option<NodeId> {
        self.leaders
            .get(&group_id)
            .copied()
            .or_else(|| self.members(group_id).first().copied())
    }

    /// Members, leader and predicates of every group, plus an entry for
    /// group 0 when some predicate has no owner
    pub fn layout(&self) -> Vec<GroupLayout> {
        let mut groups = self.groups();
        groups.extend(self.predicates.values().map(|p| p.group));

        groups
            .into_iter()
            .map(|group_id| GroupLayout {
                group_id,
                members: self.members(group_id),
                leader: self.leader(group_id),
                predicates: self
                    .predicates
                    .iter()
                    .filter(|(_, p)| p.group == group_id)
                    .map(|(name, _)| name.clone())
                    .collect(),
            })
            .collect()
    }
}

/// Nodes built from a cluster description, wired to each other in-process
pub struct LocalCluster {
    nodes: BTreeMap<NodeId, Node>,
}

impl LocalCluster {
    /// Build every node of `cluster_file`.
    ///
    /// Each node sees the same tablet assignment and membership, holds the
    /// schema of the predicates its groups own, and reaches the leader of
    /// every other group through that leader's `WorkerService`.
    pub fn build(cluster_file: &ClusterFile, config: &CoordinatorConfig) -> ConfigResult<Self> {
        cluster_file.validate()?;

        let mut nodes = BTreeMap::new();
        for entry in &cluster_file.nodes {
            let node = Node::new(entry.id, config.clone());
            node.health.set_ready(entry.ready);
            for group_id in &entry.groups {
                node.topology.serve_group(*group_id);
            }
            nodes.insert(entry.id, node);
        }

        let groups = cluster_file.groups();
        for node in nodes.values() {
            for group_id in &groups {
                node.topology.add_group(*group_id);
            }
            for (name, predicate) in &cluster_file.predicates {
                node.topology.assign_tablet(name.as_str(), predicate.group);
                if node.topology.serves_group(predicate.group) {
                    node.catalog.define(name.as_str(), predicate.schema.clone());
                }
            }
        }

        for group_id in &groups {
            let leader = cluster_file.leader(*group_id).and_then(|id| nodes.get(&id));
            let Some(leader) = leader else {
                continue;
            };
            let client: Arc<dyn WorkerClient> = leader.service.clone();
            for node in nodes.values() {
                if !node.topology.serves_group(*group_id) {
                    node.topology.set_leader(*group_id, client.clone());
                }
            }
        }

        let node_count = nodes.len().to_string();
        let group_count = groups.len().to_string();
        log_event(
            Event::ClusterLoaded,
            &[("groups", group_count.as_str()), ("nodes", node_count.as_str())],
        );
        Ok(Self { nodes })
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// All nodes, ascending by id
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }
}
