//! Pending item query use case

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::StampingItem;
use crate::error::WorkflowError;
use crate::ports::ItemQuery;

use super::authenticate::AuthenticateUseCase;

/// Use case for listing items that still await stamping
///
/// Issues a single projected, filtered read. Ordering is whatever the store
/// returns, and failures are surfaced immediately without retry.
pub struct LoadPendingUseCase {
    auth: Arc<AuthenticateUseCase>,
    query: ItemQuery,
}

impl LoadPendingUseCase {
    /// Creates a new LoadPendingUseCase
    ///
    /// # Arguments
    ///
    /// * `auth` - Source of authenticated store clients
    /// * `determination` - Filing determination an item must carry to be pending
    pub fn new(auth: Arc<AuthenticateUseCase>, determination: &str) -> Self {
        Self {
            auth,
            query: ItemQuery::pending(determination),
        }
    }

    pub fn query(&self) -> &ItemQuery {
        &self.query
    }

    /// Fetches the pending items
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Data`] if the payload cannot be deserialized,
    /// and the classified store error for anything else.
    pub async fn load_pending(&self) -> Result<Vec<StampingItem>, WorkflowError> {
        let store = self.auth.client().await?;

        debug!(filter = ?self.query.filter, "Querying pending items");
        let items = self
            .auth
            .guard()
            .run("query_items", store.query_items(&self.query))
            .await?;

        info!(count = items.len(), "Loaded pending items");
        Ok(items)
    }
}
