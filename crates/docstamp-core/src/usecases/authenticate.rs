//! Authentication use case
//!
//! Hands out authenticated store clients and verifies the signed-in
//! identity. Verification recovers from a stale cached credential by
//! invalidating the cache and probing once more; a second failure is final.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::Identity;
use crate::error::WorkflowError;
use crate::ports::{IListStore, ISessionProvider, StoreError};

use super::guard::CallGuard;

/// Use case for obtaining clients and verifying identity
pub struct AuthenticateUseCase {
    sessions: Arc<dyn ISessionProvider>,
    guard: CallGuard,
}

impl AuthenticateUseCase {
    /// Creates a new AuthenticateUseCase
    ///
    /// # Arguments
    ///
    /// * `sessions` - Session provider owning the credential strategy
    /// * `guard` - Deadline and cancellation applied to every remote call
    pub fn new(sessions: Arc<dyn ISessionProvider>, guard: CallGuard) -> Self {
        Self { sessions, guard }
    }

    pub fn guard(&self) -> &CallGuard {
        &self.guard
    }

    /// Builds a store client from the cached credential
    ///
    /// Failing to obtain a credential is reported as
    /// [`WorkflowError::Authentication`].
    pub async fn client(&self) -> Result<Arc<dyn IListStore>, WorkflowError> {
        self.authenticated_client()
            .await
            .map_err(|e| match e {
                StoreError::Cancelled | StoreError::Timeout(_) => WorkflowError::from(e),
                other => WorkflowError::Authentication(other),
            })
    }

    /// Resolves the signed-in identity
    ///
    /// 1. Builds a client and probes the identity endpoint
    /// 2. On failure, invalidates the credential cache, builds a fresh
    ///    client, and probes exactly once more
    /// 3. A second failure is surfaced as [`WorkflowError::Authentication`]
    ///
    /// Invalidation is process-wide: every later caller re-authenticates.
    pub async fn verify(&self) -> Result<Identity, WorkflowError> {
        let first = match self.probe().await {
            Ok(identity) => {
                debug!(user = %identity.title, "Identity probe succeeded");
                return Ok(identity);
            }
            Err(StoreError::Cancelled) => return Err(WorkflowError::Cancelled),
            Err(e) => e,
        };

        warn!(error = %first, "Identity probe failed, invalidating cached credentials");
        self.guard
            .run("invalidate_credentials", self.sessions.invalidate_credentials())
            .await
            .map_err(|e| match e {
                StoreError::Cancelled => WorkflowError::Cancelled,
                other => WorkflowError::Authentication(other),
            })?;

        match self.probe().await {
            Ok(identity) => {
                info!(user = %identity.title, "Identity probe succeeded after re-authentication");
                Ok(identity)
            }
            Err(StoreError::Cancelled) => Err(WorkflowError::Cancelled),
            Err(second) => {
                warn!(error = %second, "Identity probe failed after re-authentication");
                Err(WorkflowError::Authentication(second))
            }
        }
    }

    async fn probe(&self) -> Result<Identity, StoreError> {
        let store = self.authenticated_client().await?;
        self.guard.run("current_user", store.current_user()).await
    }

    /// Obtaining a credential may wait on an interactive login, so it is
    /// bound by cancellation only, never by the per-call deadline
    async fn authenticated_client(&self) -> Result<Arc<dyn IListStore>, StoreError> {
        self.guard
            .run_cancellable("authenticate", self.sessions.authenticated_client())
            .await
    }
}
