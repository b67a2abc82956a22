//! Schema Fan-out Tests
//!
//! End-to-end tests for schema resolution across an in-process cluster:
//! - Requests are partitioned by owning group and merged into one list
//! - Empty requests expand to every known group
//! - The first failing group fails the whole call
//! - Cancellation and deadlines end the call with no partial results

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aerograph::cluster::{SchemaFuture, TopologyOracle, WorkerClient};
use aerograph::config::CoordinatorConfig;
use aerograph::context::RequestContext;
use aerograph::node::{ClusterFile, LocalCluster};
use aerograph::schema::{SchemaNode, SchemaRequest, SchemaResult};
use aerograph::worker::{partition, WorkerError, WorkerResult};

// =============================================================================
// Helper Functions
// =============================================================================

/// Node n serves group n. Group 1 holds name and email, group 2 age,
/// group 3 friend.
const CLUSTER: &str = r#"{
    "nodes": [
        {"id": 1, "groups": [1]},
        {"id": 2, "groups": [2]},
        {"id": 3, "groups": [3]}
    ],
    "predicates": {
        "name": {"group": 1, "type": "string", "tokenizers": ["exact", "term"], "lang": true},
        "email": {"group": 1, "type": "string", "tokenizers": ["exact"], "upsert": true},
        "age": {"group": 2, "type": "int"},
        "friend": {"group": 3, "type": "uid", "reverse": true, "count": true, "list": true}
    }
}"#;

fn cluster() -> LocalCluster {
    let cluster_file = ClusterFile::from_json(CLUSTER).unwrap();
    LocalCluster::build(&cluster_file, &CoordinatorConfig::default()).unwrap()
}

fn sorted(mut nodes: Vec<SchemaNode>) -> Vec<SchemaNode> {
    nodes.sort_by(|a, b| a.predicate.cmp(&b.predicate));
    nodes
}

fn predicates(nodes: &[SchemaNode]) -> Vec<&str> {
    let mut names: Vec<&str> = nodes.iter().map(|n| n.predicate.as_str()).collect();
    names.sort_unstable();
    names
}

/// Leader that never answers
struct StalledClient;

impl WorkerClient for StalledClient {
    fn schema(&self, _ctx: RequestContext, _request: SchemaRequest) -> SchemaFuture<'_> {
        Box::pin(std::future::pending::<WorkerResult<SchemaResult>>())
    }
}

/// Leader whose transport always fails
struct FailingClient {
    calls: AtomicUsize,
}

impl WorkerClient for FailingClient {
    fn schema(&self, _ctx: RequestContext, _request: SchemaRequest) -> SchemaFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {
            let result: WorkerResult<SchemaResult> =
                Err(WorkerError::remote("connection reset by peer"));
            result
        })
    }
}

// =============================================================================
// Resolution Tests
// =============================================================================

/// Named predicates in two groups resolve to one merged list.
#[tokio::test]
async fn test_local_and_remote_predicates_merge() {
    let cluster = cluster();
    let request = SchemaRequest::for_predicates(["name", "age"]).with_fields(["type", "index"]);

    let nodes = cluster.node(1).unwrap().describe(&request).await.unwrap();

    let mut age = SchemaNode::named("age");
    age.type_name = "int".to_string();
    let mut name = SchemaNode::named("name");
    name.type_name = "string".to_string();
    name.index = true;
    assert_eq!(sorted(nodes), vec![age, name]);
}

/// Resolution gives the same answer from any node.
#[tokio::test]
async fn test_result_independent_of_origin() {
    let cluster = cluster();
    let request = SchemaRequest::for_predicates(["name", "age", "friend"]);

    let mut answers = Vec::new();
    for node in cluster.nodes() {
        answers.push(sorted(node.describe(&request).await.unwrap()));
    }

    assert_eq!(answers.len(), 3);
    assert!(answers.windows(2).all(|w| w[0] == w[1]));
}

/// An empty request reaches every known group and each expands to its own
/// predicates with the default field set.
#[tokio::test]
async fn test_empty_request_expands_to_every_group() {
    let cluster = cluster();
    let origin = cluster.node(1).unwrap();

    let nodes = sorted(origin.describe(&SchemaRequest::all()).await.unwrap());

    assert_eq!(predicates(&nodes), vec!["age", "email", "friend", "name"]);

    let friend = &nodes[2];
    assert_eq!(friend.type_name, "uid");
    assert!(friend.reverse && friend.count && friend.list);
    assert!(!friend.index);
    assert!(friend.tokenizer.is_empty());

    let name = &nodes[3];
    assert!(name.index);
    assert_eq!(name.tokenizer, vec!["exact", "term"]);
    assert!(name.lang);

    let snapshot = origin.coordinator.metrics().snapshot();
    assert_eq!(snapshot.local_dispatches, 1);
    assert_eq!(snapshot.remote_dispatches, 2);
}

/// Tokenizers are reported only for indexed predicates, even when asked.
#[tokio::test]
async fn test_tokenizer_only_for_indexed() {
    let cluster = cluster();
    let request =
        SchemaRequest::for_predicates(["email", "age"]).with_fields(["tokenizer", "upsert"]);

    let nodes = sorted(cluster.node(2).unwrap().describe(&request).await.unwrap());

    assert_eq!(nodes[0].predicate, "age");
    assert!(nodes[0].tokenizer.is_empty());
    assert_eq!(nodes[1].tokenizer, vec!["exact"]);
    assert!(nodes[1].upsert);
    // Not requested
    assert!(nodes[1].type_name.is_empty());
}

/// A predicate without a schema is left out, never reported zeroed.
#[tokio::test]
async fn test_undefined_predicate_omitted() {
    let cluster = cluster();
    cluster.node(2).unwrap().catalog.remove("age");

    let request = SchemaRequest::for_predicates(["name", "age"]);
    let nodes = cluster.node(1).unwrap().describe(&request).await.unwrap();

    assert_eq!(predicates(&nodes), vec!["name"]);
}

/// A predicate named twice is described once.
#[tokio::test]
async fn test_duplicate_predicate_described_once() {
    let cluster = cluster();
    let request = SchemaRequest::for_predicates(["age", "age"]);

    let nodes = cluster.node(1).unwrap().describe(&request).await.unwrap();

    assert_eq!(predicates(&nodes), vec!["age"]);
}

// =============================================================================
// Failure Tests
// =============================================================================

/// An unhealthy node refuses before dispatching anything.
#[tokio::test]
async fn test_unhealthy_node_refuses() {
    let cluster = cluster();
    let origin = cluster.node(1).unwrap();
    origin.health.set_ready(false);

    let err = origin.describe(&SchemaRequest::all()).await.unwrap_err();

    assert!(matches!(err, WorkerError::Health(_)));
    let snapshot = origin.coordinator.metrics().snapshot();
    assert_eq!(snapshot.local_dispatches + snapshot.remote_dispatches, 0);
    assert_eq!(snapshot.resolutions_failed, 1);
}

/// One unowned predicate fails the request before any dispatch.
#[tokio::test]
async fn test_unrouted_predicate_fails_before_dispatch() {
    let cluster = cluster();
    let origin = cluster.node(1).unwrap();

    let request = SchemaRequest::for_predicates(["name", "nickname"]);
    let err = origin.describe(&request).await.unwrap_err();

    assert_eq!(err, WorkerError::UnservedTablet);
    let snapshot = origin.coordinator.metrics().snapshot();
    assert_eq!(snapshot.local_dispatches + snapshot.remote_dispatches, 0);
}

/// A group with no reachable leader fails the whole call.
#[tokio::test]
async fn test_missing_leader_fails_whole_call() {
    let cluster = cluster();
    let origin = cluster.node(1).unwrap();
    origin.topology.clear_leader(3);

    let err = origin.describe(&SchemaRequest::all()).await.unwrap_err();

    assert_eq!(err, WorkerError::NoConnection { group_id: 3 });
}

/// A stale leader view surfaces the peer's refusal unchanged.
#[tokio::test]
async fn test_stale_leader_reports_wrong_group() {
    let cluster = cluster();
    let origin = cluster.node(1).unwrap();
    let stale: Arc<dyn WorkerClient> = cluster.node(2).unwrap().service.clone();
    origin.topology.set_leader(3, stale);

    let request = SchemaRequest::for_predicates(["friend"]);
    let err = origin.describe(&request).await.unwrap_err();

    assert_eq!(err, WorkerError::WrongGroup { group_id: 3 });
    assert_eq!(
        cluster
            .node(2)
            .unwrap()
            .service
            .metrics()
            .snapshot()
            .remote_requests_rejected,
        1
    );
}

/// Transport failures pass through verbatim and are not retried.
#[tokio::test]
async fn test_remote_failure_not_retried() {
    let cluster = cluster();
    let origin = cluster.node(1).unwrap();
    let failing = Arc::new(FailingClient {
        calls: AtomicUsize::new(0),
    });
    let client: Arc<dyn WorkerClient> = failing.clone();
    origin.topology.set_leader(2, client);

    let err = origin.describe(&SchemaRequest::all()).await.unwrap_err();

    assert_eq!(err, WorkerError::remote("connection reset by peer"));
    assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Cancellation Tests
// =============================================================================

/// Cancelling while a group is stalled returns the cancellation, not the
/// results of the groups that did answer.
#[tokio::test]
async fn test_cancel_while_group_stalled() {
    let cluster = cluster();
    let origin = cluster.node(1).unwrap();
    origin.topology.set_leader(2, Arc::new(StalledClient));

    let (ctx, handle) = RequestContext::with_cancel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
    });

    let err = origin
        .coordinator
        .resolve_schema_over_network(&ctx, &SchemaRequest::all())
        .await
        .unwrap_err();

    assert_eq!(err, WorkerError::Cancelled);
    assert_eq!(origin.coordinator.metrics().snapshot().resolutions_cancelled, 1);
}

/// A deadline bounds a call whose leader never answers.
#[tokio::test]
async fn test_deadline_while_group_stalled() {
    let cluster = cluster();
    let origin = cluster.node(1).unwrap();
    origin.topology.set_leader(3, Arc::new(StalledClient));

    let ctx = RequestContext::background().with_timeout(Duration::from_millis(50));
    let err = origin
        .coordinator
        .resolve_schema_over_network(&ctx, &SchemaRequest::for_predicates(["friend"]))
        .await
        .unwrap_err();

    assert_eq!(err, WorkerError::DeadlineExceeded);
}

/// The configured request timeout applies to contexts the node creates.
#[tokio::test]
async fn test_configured_timeout_applies() {
    let cluster_file = ClusterFile::from_json(CLUSTER).unwrap();
    let config = CoordinatorConfig::default().with_request_timeout(Duration::from_millis(50));
    let cluster = LocalCluster::build(&cluster_file, &config).unwrap();
    let origin = cluster.node(1).unwrap();
    origin.topology.set_leader(2, Arc::new(StalledClient));

    let err = origin
        .describe(&SchemaRequest::for_predicates(["age"]))
        .await
        .unwrap_err();

    assert_eq!(err, WorkerError::DeadlineExceeded);
}

// =============================================================================
// Partition Tests
// =============================================================================

/// Every named predicate lands in exactly one group and nothing is added.
#[test]
fn test_partition_covers_request_exactly() {
    let cluster = cluster();
    let topology = cluster.node(1).unwrap().topology.clone();
    let request = SchemaRequest::for_predicates(["friend", "name", "age", "email", "name"]);

    let schema_map = partition(topology.as_ref(), &request);

    let mut seen = BTreeSet::new();
    for (group_id, sub_request) in &schema_map {
        assert_eq!(sub_request.group_id, *group_id);
        for predicate in &sub_request.predicates {
            assert_eq!(topology.belongs_to(predicate), *group_id);
            assert!(seen.insert(predicate.as_str()), "{} assigned twice", predicate);
        }
    }
    let expected: BTreeSet<&str> = ["age", "email", "friend", "name"].into_iter().collect();
    assert_eq!(seen, expected);
}

/// The same request and topology always partition the same way.
#[test]
fn test_partition_is_deterministic() {
    let cluster = cluster();
    let topology = cluster.node(3).unwrap().topology.clone();
    let request = SchemaRequest::for_predicates(["age", "friend", "name"]).with_fields(["type"]);

    let first = partition(topology.as_ref(), &request);
    for _ in 0..10 {
        assert_eq!(partition(topology.as_ref(), &request), first);
    }
}

/// An empty request partitions into one empty sub-request per known group.
#[test]
fn test_partition_empty_request() {
    let cluster = cluster();
    let topology = cluster.node(2).unwrap().topology.clone();

    let schema_map = partition(topology.as_ref(), &SchemaRequest::all());

    assert_eq!(schema_map.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(schema_map.values().all(|r| r.predicates.is_empty()));
}
