//! Worker transport seam
//!
//! A leader connection is anything that can answer a forwarded schema
//! sub-request. Network stacks implement this trait; in-process peers use
//! `WorkerService` directly.

use std::future::Future;
use std::pin::Pin;

use crate::context::RequestContext;
use crate::schema::{SchemaRequest, SchemaResult};
use crate::worker::WorkerResult;

/// Future returned by a forwarded schema call
pub type SchemaFuture<'a> = Pin<Box<dyn Future<Output = WorkerResult<SchemaResult>> + Send + 'a>>;

/// Client side of the worker `Schema` call
pub trait WorkerClient: Send + Sync {
    /// Forward a group-scoped sub-request to the peer.
    ///
    /// Transport failures come back as `WorkerError::Remote`; errors raised by
    /// the peer itself are passed through verbatim.
    fn schema(&self, ctx: RequestContext, request: SchemaRequest) -> SchemaFuture<'_>;
}
