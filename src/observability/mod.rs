//! Observability for the schema fan-out path
//!
//! - Structured logging (JSON lines)
//! - Fan-out counters
//! - Typed events and begin/complete scopes
//!
//! Observability is read-only: nothing here changes how a request resolves.
//!
//! # Usage
//!
//! ```ignore
//! use aerograph::observability::{Event, Logger, ObservationScope};
//!
//! Logger::trace(Event::DispatchRemote.as_str(), &[("group_id", "2")]);
//!
//! let scope = ObservationScope::new("SCHEMA_RESOLVE");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{FanoutMetrics, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Log a typed event with fields
///
/// Failure events are logged at WARN, everything else at TRACE.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    if event.is_failure() {
        Logger::warn(event.as_str(), fields);
    } else {
        Logger::trace(event.as_str(), fields);
    }
}
