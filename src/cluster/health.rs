//! Process readiness
//!
//! Consulted once at the start of every top-level resolution.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::worker::{WorkerError, WorkerResult};

/// Readiness check
pub trait HealthCheck: Send + Sync {
    /// `Ok(())` if the process may serve requests
    fn health_check(&self) -> WorkerResult<()>;
}

/// Readiness flag, not ready until set
#[derive(Debug, Default)]
pub struct HealthFlag {
    ready: AtomicBool,
}

impl HealthFlag {
    /// Create a flag in the not-ready state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a flag in the ready state
    pub fn ready() -> Self {
        Self {
            ready: AtomicBool::new(true),
        }
    }

    /// Flip readiness
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check readiness
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

impl HealthCheck for HealthFlag {
    fn health_check(&self) -> WorkerResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(WorkerError::health(
                "Please retry again, server is not ready to accept requests",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_by_default() {
        let flag = HealthFlag::new();
        assert!(matches!(flag.health_check(), Err(WorkerError::Health(_))));
    }

    #[test]
    fn test_set_ready() {
        let flag = HealthFlag::new();
        flag.set_ready(true);
        assert!(flag.health_check().is_ok());

        flag.set_ready(false);
        assert!(flag.health_check().is_err());
    }

    #[test]
    fn test_ready_constructor() {
        assert!(HealthFlag::ready().is_ready());
    }
}
