//! Scatter-gather schema resolution
//!
//! One task per owning group, each answering locally or forwarding to the
//! group leader. The aggregator collects results until every group has
//! answered, the first error arrives, or the caller gives up.
//!
//! Dispatched tasks are never aborted. The results channel has one slot per
//! task, so a task finishing after the aggregator has returned writes into
//! free capacity (or a closed channel) and exits without blocking.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::errors::{WorkerError, WorkerResult};
use super::partition::{partition, SchemaMap};
use crate::cluster::{GroupId, HealthCheck, TopologyOracle, UNROUTED_GROUP};
use crate::config::CoordinatorConfig;
use crate::context::RequestContext;
use crate::observability::{log_event, Event, FanoutMetrics, ObservationScope};
use crate::schema::{LocalProjector, SchemaNode, SchemaRequest, SchemaResult};

/// Outcome of one group's lookup
#[derive(Debug)]
struct GroupOutcome {
    group_id: GroupId,
    result: WorkerResult<SchemaResult>,
}

/// Resolves schema requests across shard groups
pub struct SchemaCoordinator {
    topology: Arc<dyn TopologyOracle>,
    projector: Arc<LocalProjector>,
    health: Arc<dyn HealthCheck>,
    metrics: Arc<FanoutMetrics>,
    config: CoordinatorConfig,
}

impl SchemaCoordinator {
    /// Create a coordinator with default configuration
    pub fn new(
        topology: Arc<dyn TopologyOracle>,
        projector: Arc<LocalProjector>,
        health: Arc<dyn HealthCheck>,
    ) -> Self {
        Self {
            topology,
            projector,
            health,
            metrics: Arc::new(FanoutMetrics::new()),
            config: CoordinatorConfig::default(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a metrics registry with other components of this node
    pub fn with_metrics(mut self, metrics: Arc<FanoutMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Get the metrics registry
    pub fn metrics(&self) -> &Arc<FanoutMetrics> {
        &self.metrics
    }

    /// Get the configuration
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// A fresh context carrying the configured request timeout
    pub fn context(&self) -> RequestContext {
        let ctx = RequestContext::background();
        match self.config.request_timeout() {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }

    /// Describe the requested predicates across every owning group.
    ///
    /// Returns either the complete node list, in no particular order across
    /// groups, or the first error observed. Never a mix of both.
    pub async fn resolve_schema_over_network(
        &self,
        ctx: &RequestContext,
        request: &SchemaRequest,
    ) -> WorkerResult<Vec<SchemaNode>> {
        let request_id = ctx.request_id.to_string();
        let node_id = self.config.node_id.to_string();
        let scope = ObservationScope::with_fields(
            "SCHEMA_RESOLVE",
            &[("node_id", node_id.as_str()), ("request_id", request_id.as_str())],
        );
        self.metrics.increment_resolutions_started();

        match self.resolve(ctx, request).await {
            Ok(nodes) => {
                self.metrics.increment_resolutions_succeeded();
                let count = nodes.len().to_string();
                scope.complete_with_fields(&[("nodes", count.as_str())]);
                Ok(nodes)
            }
            Err(err) => {
                if err.is_cancellation() {
                    self.metrics.increment_resolutions_cancelled();
                } else {
                    self.metrics.increment_resolutions_failed();
                }
                scope.fail(err.code(), &err.to_string());
                Err(err)
            }
        }
    }

    async fn resolve(
        &self,
        ctx: &RequestContext,
        request: &SchemaRequest,
    ) -> WorkerResult<Vec<SchemaNode>> {
        if let Err(err) = self.health.health_check() {
            log_event(Event::HealthCheckFailed, &[("reason", err.to_string().as_str())]);
            return Err(err);
        }

        let schema_map = partition(self.topology.as_ref(), request);
        if let Some(unrouted) = schema_map.get(&UNROUTED_GROUP) {
            let predicates = unrouted.predicates.join(",");
            log_event(Event::UnservedTablet, &[("predicates", predicates.as_str())]);
            return Err(WorkerError::UnservedTablet);
        }
        if schema_map.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        self.gather(ctx, schema_map).await
    }

    async fn gather(
        &self,
        ctx: &RequestContext,
        schema_map: SchemaMap,
    ) -> WorkerResult<Vec<SchemaNode>> {
        let expected = schema_map.len();
        let (results, mut received) = mpsc::channel(expected);

        for (group_id, sub_request) in schema_map {
            self.dispatch(ctx.clone(), group_id, sub_request, results.clone());
        }
        drop(results);

        let mut schema_nodes = Vec::new();
        for _ in 0..expected {
            // Context first: a context already done wins over ready results
            tokio::select! {
                biased;

                err = ctx.done() => return Err(err),
                outcome = received.recv() => {
                    let Some(outcome) = outcome else {
                        return Err(WorkerError::internal(
                            "schema task exited without reporting a result",
                        ));
                    };
                    let GroupOutcome { group_id, result } = outcome;
                    match result {
                        Ok(result) => schema_nodes.extend(result.schema),
                        Err(err) => {
                            let group = group_id.to_string();
                            log_event(
                                Event::GroupFailed,
                                &[("code", err.code()), ("group_id", group.as_str())],
                            );
                            return Err(err);
                        }
                    }
                }
            }
        }

        Ok(schema_nodes)
    }

    /// Spawn the lookup for one group. Writes exactly one outcome.
    fn dispatch(
        &self,
        ctx: RequestContext,
        group_id: GroupId,
        request: SchemaRequest,
        results: mpsc::Sender<GroupOutcome>,
    ) {
        let topology = Arc::clone(&self.topology);
        let projector = Arc::clone(&self.projector);
        let metrics = Arc::clone(&self.metrics);

        tokio::spawn(async move {
            let group = group_id.to_string();
            let result = if topology.serves_group(group_id) {
                metrics.increment_local_dispatches();
                log_event(Event::DispatchLocal, &[("group_id", group.as_str())]);
                Ok(projector.project_request(&request))
            } else {
                match topology.leader(group_id) {
                    Some(leader) => {
                        metrics.increment_remote_dispatches();
                        log_event(Event::DispatchRemote, &[("group_id", group.as_str())]);
                        leader.schema(ctx, request).await
                    }
                    None => {
                        log_event(Event::NoLeaderConnection, &[("group_id", group.as_str())]);
                        Err(WorkerError::NoConnection { group_id })
                    }
                }
            };

            // Capacity covers every task, so this only fails once the
            // aggregator has stopped listening.
            if results.try_send(GroupOutcome { group_id, result }).is_err() {
                log_event(Event::LateResultDropped, &[("group_id", group.as_str())]);
            }
        });
    }
}
