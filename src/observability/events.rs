//! Observable events of the schema fan-out path
//!
//! Events are explicit and typed. Begin/complete pairs for a whole resolution
//! are emitted by `ObservationScope`; these cover the points in between.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Coordinator configuration loaded
    ConfigLoaded,
    /// In-process cluster description loaded
    ClusterLoaded,

    // Coordinator
    /// Health check refused the request before dispatch
    HealthCheckFailed,
    /// A predicate had no owning group
    UnservedTablet,
    /// Sub-request answered by this node
    DispatchLocal,
    /// Sub-request forwarded to a group leader
    DispatchRemote,
    /// No leader connection for a group
    NoLeaderConnection,
    /// A group reported an error; the whole resolution fails
    GroupFailed,
    /// A group task finished after the aggregator stopped listening
    LateResultDropped,

    // Projection
    /// Local projection finished
    ProjectComplete,
    /// Predicate skipped because its tablet is served elsewhere
    TabletNotServed,

    // Remote entry point
    /// Forwarded sub-request served
    RemoteRequestServed,
    /// Forwarded sub-request addressed to a group this node does not serve
    RemoteRequestRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ClusterLoaded => "CLUSTER_LOADED",

            Event::HealthCheckFailed => "HEALTH_CHECK_FAILED",
            Event::UnservedTablet => "SCHEMA_UNSERVED_TABLET",
            Event::DispatchLocal => "SCHEMA_DISPATCH_LOCAL",
            Event::DispatchRemote => "SCHEMA_DISPATCH_REMOTE",
            Event::NoLeaderConnection => "SCHEMA_NO_LEADER_CONNECTION",
            Event::GroupFailed => "SCHEMA_GROUP_FAILED",
            Event::LateResultDropped => "SCHEMA_LATE_RESULT_DROPPED",

            Event::ProjectComplete => "SCHEMA_PROJECT_COMPLETE",
            Event::TabletNotServed => "SCHEMA_TABLET_NOT_SERVED",

            Event::RemoteRequestServed => "SCHEMA_REMOTE_SERVED",
            Event::RemoteRequestRejected => "SCHEMA_REMOTE_REJECTED",
        }
    }

    /// Returns true if the event reports a failed request
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::HealthCheckFailed
                | Event::UnservedTablet
                | Event::NoLeaderConnection
                | Event::GroupFailed
                | Event::RemoteRequestRejected
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
