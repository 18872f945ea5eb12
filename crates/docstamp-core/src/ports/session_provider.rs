//! Session provider port
//!
//! A session provider owns the credential strategy for one site and hands
//! out store clients bound to it. It is injected into every use case instead
//! of being read from ambient process state, so tests can substitute fakes.
//!
//! The credential cache behind a provider may be shared process-wide (the
//! SharePoint adapter keeps it in the OS keyring): invalidating it affects
//! every later caller, not just the one that observed the failure.

use std::sync::Arc;

use super::list_store::{IListStore, StoreError};

#[async_trait::async_trait]
pub trait ISessionProvider: Send + Sync {
    /// Builds a store client bound to the configured site using the cached
    /// credential, acquiring one first if the cache is empty
    async fn authenticated_client(&self) -> Result<Arc<dyn IListStore>, StoreError>;

    /// Drops the cached credential so the next client re-authenticates
    async fn invalidate_credentials(&self) -> Result<(), StoreError>;
}
