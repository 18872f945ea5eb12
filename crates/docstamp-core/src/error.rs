//! Workflow error taxonomy
//!
//! [`WorkflowError`] is what the façade hands to its UI collaborator. Store
//! failures are classified on the way in so the collaborator can decide how
//! to present them without inspecting HTTP details.

use std::time::Duration;

use thiserror::Error;

use crate::domain::{DomainError, ItemId, ReplacementState};
use crate::ports::StoreError;

/// Errors surfaced by the workflow operations
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The store could not be reached with a valid identity
    #[error("Cannot reach store: {0}")]
    Authentication(#[source] StoreError),

    /// The item or attachment does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A request to the store failed
    #[error("Transport error: {0}")]
    Transport(#[source] StoreError),

    /// The store returned a payload that could not be interpreted
    #[error("Malformed data from store: {0}")]
    Data(String),

    /// The item does not carry exactly one attachment
    #[error("Item {id} has {found} attachments, expected exactly one")]
    UnexpectedAttachments {
        /// The item that was inspected
        id: ItemId,
        /// How many attachments it has
        found: usize,
    },

    /// An attachment swap mutated the store but did not complete
    #[error("Replacement of item {id} stopped after step '{state}': {source}")]
    PartialReplacement {
        /// The item being replaced
        id: ItemId,
        /// Last step the store confirmed
        state: ReplacementState,
        /// The failure that stopped the swap
        #[source]
        source: Box<WorkflowError>,
    },

    /// Another replacement of the same item has not finished yet
    #[error("A replacement of item {0} is already in progress")]
    ReplacementInProgress(ItemId),

    /// The payload handed in by the caller is unusable
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A remote call exceeded its deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The operation was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// A domain rule was violated
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl WorkflowError {
    /// Returns true if invoking the same operation again might succeed
    ///
    /// Partial replacements are retryable: the next upload of the same item
    /// resumes from the last confirmed step.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkflowError::Transport(e) => e.is_transient(),
            WorkflowError::Timeout(_) | WorkflowError::PartialReplacement { .. } => true,
            _ => false,
        }
    }

    /// Returns true for authentication failures
    pub fn is_authentication(&self) -> bool {
        matches!(self, WorkflowError::Authentication(_))
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => WorkflowError::NotFound(msg),
            StoreError::InvalidResponse(msg) => WorkflowError::Data(msg),
            StoreError::Timeout(after) => WorkflowError::Timeout(after),
            StoreError::Cancelled => WorkflowError::Cancelled,
            e if e.is_auth() => WorkflowError::Authentication(e),
            e => WorkflowError::Transport(e),
        }
    }
}
