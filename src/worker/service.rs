//! Remote entry point
//!
//! Inbound side of the worker `Schema` call: a peer forwards a sub-request
//! addressed to one group, and this node answers it from its local catalog.

use std::sync::Arc;

use super::errors::{WorkerError, WorkerResult};
use crate::cluster::{SchemaFuture, TopologyOracle, WorkerClient};
use crate::context::RequestContext;
use crate::observability::{log_event, Event, FanoutMetrics};
use crate::schema::{LocalProjector, SchemaRequest, SchemaResult};

/// Serves forwarded schema sub-requests
pub struct WorkerService {
    topology: Arc<dyn TopologyOracle>,
    projector: Arc<LocalProjector>,
    metrics: Arc<FanoutMetrics>,
}

impl WorkerService {
    /// Create a service answering from `projector`
    pub fn new(topology: Arc<dyn TopologyOracle>, projector: Arc<LocalProjector>) -> Self {
        Self {
            topology,
            projector,
            metrics: Arc::new(FanoutMetrics::new()),
        }
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

    /// Answer a sub-request forwarded by another node.
    ///
    /// A context that is already done is reported without doing any work.
    /// A request for a group this node does not serve means the caller's
    /// leadership view is stale; it is refused, not redirected.
    pub fn serve_schema(
        &self,
        ctx: &RequestContext,
        request: &SchemaRequest,
    ) -> WorkerResult<SchemaResult> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let group_id = request.group_id.to_string();
        if !self.topology.serves_group(request.group_id) {
            self.metrics.increment_remote_requests_rejected();
            log_event(
                Event::RemoteRequestRejected,
                &[("group_id", group_id.as_str())],
            );
            return Err(WorkerError::WrongGroup {
                group_id: request.group_id,
            });
        }

        self.metrics.increment_remote_requests_served();
        log_event(
            Event::RemoteRequestServed,
            &[("group_id", group_id.as_str())],
        );
        Ok(self.projector.project_request(request))
    }
}

impl WorkerClient for WorkerService {
    fn schema(&self, ctx: RequestContext, request: SchemaRequest) -> SchemaFuture<'_> {
        Box::pin(async move { self.serve_schema(&ctx, &request) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::StaticTopology;
    use crate::schema::{MemoryCatalog, PredicateSchema, TypeId};

    fn service() -> WorkerService {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.define("age", PredicateSchema::new(TypeId::Int));
        catalog.define("name", PredicateSchema::new(TypeId::String).indexed(["exact"]));

        let topology = Arc::new(StaticTopology::new());
        topology.serve_group(2);
        topology.assign_tablet("age", 2);
        topology.assign_tablet("name", 1);

        let projector = Arc::new(LocalProjector::new(catalog, topology.clone()));
        WorkerService::new(topology, projector)
    }

    #[test]
    fn test_serves_addressed_group() {
        let service = service();
        let request = SchemaRequest::for_group(2, vec!["type".to_string()]);

        let result = service
            .serve_schema(&RequestContext::background(), &request)
            .unwrap();

        assert_eq!(result.schema.len(), 1);
        assert_eq!(result.schema[0].predicate, "age");
        assert_eq!(result.schema[0].type_name, "int");
        assert_eq!(service.metrics().snapshot().remote_requests_served, 1);
    }

    #[test]
    fn test_rejects_other_group() {
        let service = service();
        let request = SchemaRequest::for_group(1, Vec::new());

        let err = service
            .serve_schema(&RequestContext::background(), &request)
            .unwrap_err();

        assert_eq!(err, WorkerError::WrongGroup { group_id: 1 });
        assert_eq!(service.metrics().snapshot().remote_requests_rejected, 1);
    }

    #[test]
    fn test_rejects_unrouted_group() {
        let service = service();
        let err = service
            .serve_schema(&RequestContext::background(), &SchemaRequest::all())
            .unwrap_err();
        assert_eq!(err, WorkerError::WrongGroup { group_id: 0 });
    }

    #[test]
    fn test_cancelled_context_does_no_work() {
        let service = service();
        let (ctx, handle) = RequestContext::with_cancel();
        handle.cancel();

        // Group 1 is not served, but cancellation is checked first
        let err = service
            .serve_schema(&ctx, &SchemaRequest::for_group(1, Vec::new()))
            .unwrap_err();

        assert_eq!(err, WorkerError::Cancelled);
        let snapshot = service.metrics().snapshot();
        assert_eq!(snapshot.remote_requests_served, 0);
        assert_eq!(snapshot.remote_requests_rejected, 0);
    }

    #[tokio::test]
    async fn test_worker_client_call() {
        let service = service();
        let client: &dyn WorkerClient = &service;

        let result = client
            .schema(
                RequestContext::background(),
                SchemaRequest::for_group(2, Vec::new()),
            )
            .await
            .unwrap();

        assert_eq!(result.schema[0].predicate, "age");
    }
}
