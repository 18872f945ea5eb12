//! Remote list store port (driven/secondary port)
//!
//! This module defines the interface to the list-and-attachment service of
//! record. The primary implementation targets a SharePoint list via its REST
//! API, but nothing here is SharePoint-specific beyond the OData query
//! syntax carried in [`ItemQuery`].
//!
//! ## Design Notes
//!
//! - Errors are classified ([`StoreError`]) rather than opaque, because the
//!   use cases decide between retrying, failing, and re-authenticating based
//!   on the kind of failure.
//! - Implementations perform exactly one request per call. Retries,
//!   deadlines, and cancellation are applied by the use case layer.

use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{AttachmentInfo, AttachmentName, Identity, ItemId, StampingItem};

// ============================================================================
// StoreError
// ============================================================================

/// Errors reported by a remote list store
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Credentials were rejected or are missing (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credentials are valid but lack permission (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The item or attachment does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store rejected the change as conflicting (HTTP 409/412)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store is throttling requests
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration the store asked callers to wait
        retry_after: Duration,
    },

    /// The store refused the request as malformed (other 4xx)
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No credential could be obtained for the site
    #[error("Credential unavailable: {0}")]
    Credential(String),

    /// The call did not complete before its deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The call was cancelled before it completed
    #[error("Cancelled")]
    Cancelled,
}

impl StoreError {
    /// Returns true if the failure is about identity rather than the request
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            StoreError::Unauthorized(_) | StoreError::Forbidden(_) | StoreError::Credential(_)
        )
    }

    /// Returns true if repeating the identical request might succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::TooManyRequests { .. }
                | StoreError::ServerError(_)
                | StoreError::Network(_)
                | StoreError::Timeout(_)
        )
    }
}

// ============================================================================
// ItemQuery
// ============================================================================

/// A filtered, projected read against the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuery {
    /// Fields to project (`$select`)
    pub select: Vec<String>,
    /// OData filter expression (`$filter`)
    pub filter: Option<String>,
}

/// Fields the stamping workflow reads from each pending item
pub const PENDING_ITEM_FIELDS: &[&str] = &["Id", "CreationDate", "StagedforFiling", "SubmitterName"];

impl ItemQuery {
    /// Query for items not yet staged whose filing determination matches `determination`
    pub fn pending(determination: &str) -> Self {
        Self {
            select: PENDING_ITEM_FIELDS.iter().map(|f| f.to_string()).collect(),
            filter: Some(format!(
                "StagedforFiling eq null and Filing/Determination eq {}",
                odata_literal(determination)
            )),
        }
    }
}

/// Quotes a string as an OData literal, doubling embedded single quotes
pub fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// ============================================================================
// ItemPatch
// ============================================================================

/// A partial metadata update for one item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    fields: Map<String, Value>,
}

impl ItemPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `field` to `value`, replacing any previous value
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Patch that stamps the item as staged for filing at `timestamp` (RFC 3339)
    pub fn staged_for_filing(timestamp: &chrono::DateTime<chrono::Utc>) -> Self {
        Self::new().set(
            "StagedforFiling",
            timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        )
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The patch as a JSON object body
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

// ============================================================================
// IListStore
// ============================================================================

/// Port trait for the remote list-and-attachment store
///
/// One implementation instance is bound to one site and one list, and to
/// the credential it was built with.
#[async_trait::async_trait]
pub trait IListStore: Send + Sync {
    /// Lightweight identity probe for the credential this client carries
    async fn current_user(&self) -> Result<Identity, StoreError>;

    /// Runs a filtered, projected read; ordering is whatever the store returns
    async fn query_items(&self, query: &ItemQuery) -> Result<Vec<StampingItem>, StoreError>;

    /// Lists the attachments of one item
    async fn list_attachments(&self, id: ItemId) -> Result<Vec<AttachmentInfo>, StoreError>;

    /// Fetches the raw bytes of one attachment
    async fn download_attachment(
        &self,
        id: ItemId,
        name: &AttachmentName,
    ) -> Result<Vec<u8>, StoreError>;

    /// Deletes one attachment
    async fn delete_attachment(&self, id: ItemId, name: &AttachmentName)
        -> Result<(), StoreError>;

    /// Adds an attachment with the given name and content
    async fn add_attachment(
        &self,
        id: ItemId,
        name: &AttachmentName,
        data: &[u8],
    ) -> Result<AttachmentInfo, StoreError>;

    /// Applies a partial metadata update to one item
    async fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<(), StoreError>;
}
