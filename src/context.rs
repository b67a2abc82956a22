//! Request Context
//!
//! Carries the request id, an optional deadline and a cancellation signal
//! through a schema resolution. Clones share the same signal, so a context
//! handed to a spawned task observes cancellation of the original.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

use crate::worker::WorkerError;

/// Context carried through one resolution
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for log correlation
    pub request_id: Uuid,

    /// Point after which the request is abandoned
    deadline: Option<Instant>,

    /// Flips to `true` once when cancelled
    cancelled: watch::Receiver<bool>,
}

/// Cancels the contexts it was created with
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Cancel every context sharing this handle's signal
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        let (_sender, cancelled) = watch::channel(false);
        Self {
            request_id: Uuid::new_v4(),
            deadline: None,
            cancelled,
        }
    }

    /// A context plus the handle that cancels it
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (sender, cancelled) = watch::channel(false);
        let ctx = Self {
            request_id: Uuid::new_v4(),
            deadline: None,
            cancelled,
        };
        (
            ctx,
            CancelHandle {
                sender: Arc::new(sender),
            },
        )
    }

    /// Tighten the deadline to at most `timeout` from now. A timeout past
    /// the representable range leaves the deadline unchanged.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Tighten the deadline to at most `deadline`
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Get the deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check if the context was explicitly cancelled
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// The error this context reports right now, if it is done
    pub fn err(&self) -> Option<WorkerError> {
        if self.is_cancelled() {
            return Some(WorkerError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(WorkerError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    ///
    /// Never resolves for a background context.
    pub async fn done(&self) -> WorkerError {
        let mut cancelled = self.cancelled.clone();
        let signal = async move {
            loop {
                if *cancelled.borrow_and_update() {
                    return;
                }
                // Sender gone without cancelling: this context can no longer be cancelled
                if cancelled.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        };

        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = signal => WorkerError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => WorkerError::DeadlineExceeded,
            },
            None => {
                signal.await;
                WorkerError::Cancelled
            }
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}
