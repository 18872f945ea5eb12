//! Deadline and cancellation for remote calls
//!
//! Every call a use case makes against the store runs through a
//! [`CallGuard`], which bounds it with a per-call deadline and aborts it
//! when the shared cancellation token fires. Credential acquisition may
//! wait on an interactive login, so it is bound by cancellation only.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::ports::StoreError;

/// Default per-call deadline
pub const DEFAULT_CALL_DEADLINE: Duration = Duration::from_secs(30);

/// Applies a deadline and a cancellation token to remote calls
#[derive(Debug, Clone)]
pub struct CallGuard {
    deadline: Duration,
    cancel: CancellationToken,
}

impl CallGuard {
    pub fn new(deadline: Duration, cancel: CancellationToken) -> Self {
        Self { deadline, cancel }
    }

    /// Guard with its own, never-cancelled token
    pub fn with_deadline(deadline: Duration) -> Self {
        Self::new(deadline, CancellationToken::new())
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Runs `call` to completion, failing with [`StoreError::Timeout`] once
    /// the deadline passes or [`StoreError::Cancelled`] once the token fires
    pub async fn run<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!(operation, "Remote call cancelled");
                Err(StoreError::Cancelled)
            }
            outcome = tokio::time::timeout(self.deadline, call) => match outcome {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        operation,
                        deadline_ms = self.deadline.as_millis() as u64,
                        "Remote call exceeded its deadline"
                    );
                    Err(StoreError::Timeout(self.deadline))
                }
            },
        }
    }

    /// Runs `call` with no deadline, failing with [`StoreError::Cancelled`]
    /// once the token fires
    ///
    /// For calls paced by a person, such as a browser sign-in.
    pub async fn run_cancellable<T, F>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!(operation, "Call cancelled");
                Err(StoreError::Cancelled)
            }
            result = call => result,
        }
    }
}

impl Default for CallGuard {
    fn default() -> Self {
        Self::with_deadline(DEFAULT_CALL_DEADLINE)
    }
}
