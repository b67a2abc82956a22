//! Worker error types
//!
//! Every error on the schema resolution path is fail-fast: the first one
//! observed short-circuits aggregation and reaches the caller unchanged.
//! Nothing is retried at this layer.

use thiserror::Error;

use crate::cluster::GroupId;

/// Result type for worker operations
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors surfaced by schema resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// Process is not ready to serve; returned before any dispatch
    #[error("Health check failed: {0}")]
    Health(String),

    /// At least one predicate has no known owning group
    #[error("Tablet isn't being served by this instance")]
    UnservedTablet,

    /// No leader connection for a remote group
    #[error("No connection exists to the leader of group {group_id}")]
    NoConnection { group_id: GroupId },

    /// A peer received a sub-request for a group it does not serve
    #[error("This server doesn't serve group id: {group_id}")]
    WrongGroup { group_id: GroupId },

    /// The caller cancelled the request
    #[error("context canceled")]
    Cancelled,

    /// The caller's deadline passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// Transport-level failure from a forwarded call, passed through verbatim
    #[error("Remote call failed: {0}")]
    Remote(String),

    /// A group task exited without reporting a result
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    /// Create a health error
    pub fn health(msg: impl Into<String>) -> Self {
        Self::Health(msg.into())
    }

    /// Create a remote call error
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Health(_) => "AERO_WORKER_HEALTH",
            Self::UnservedTablet => "AERO_WORKER_UNSERVED_TABLET",
            Self::NoConnection { .. } => "AERO_WORKER_NO_CONNECTION",
            Self::WrongGroup { .. } => "AERO_WORKER_WRONG_GROUP",
            Self::Cancelled => "AERO_WORKER_CANCELLED",
            Self::DeadlineExceeded => "AERO_WORKER_DEADLINE_EXCEEDED",
            Self::Remote(_) => "AERO_WORKER_REMOTE",
            Self::Internal(_) => "AERO_WORKER_INTERNAL",
        }
    }

    /// Returns true if the caller gave up rather than the cluster failing
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Returns true if a higher layer could reasonably retry the whole call.
    ///
    /// Classification only; this layer never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Health(_)
                | Self::UnservedTablet
                | Self::NoConnection { .. }
                | Self::WrongGroup { .. }
                | Self::Remote(_)
        )
    }
}
