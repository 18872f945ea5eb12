//! Attachment replacement use case
//!
//! Swaps an item's unstamped attachment for the stamped one and marks the
//! item as staged for filing. The store offers no atomic commit across the
//! attachment collection and the item metadata, so the swap is driven as a
//! [`ReplacementProgress`] state machine:
//!
//! 1. **Delete** the current attachment, retrying the identical call once
//! 2. **Add** the stamped payload under the fixed name, retrying once
//! 3. **Mark** the item's `StagedforFiling` timestamp, attempted once
//!
//! A swap that stops after step 1 or 2 is kept in an in-process journal.
//! The next replacement of the same item re-reads the attachment list and,
//! if it still matches the journal, resumes from the last confirmed step.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use dashmap::{DashMap, DashSet};
use tracing::{debug, info, warn};

use crate::domain::{
    AttachmentInfo, AttachmentName, ItemId, ReplacementProgress, ReplacementState,
};
use crate::error::WorkflowError;
use crate::ports::{IListStore, ItemPatch, StoreError};

use super::authenticate::AuthenticateUseCase;
use super::single_attachment;

/// Use case for committing a stamped attachment
pub struct ReplaceAttachmentUseCase {
    auth: Arc<AuthenticateUseCase>,
    /// Name the stamped attachment is stored under
    stamped_name: AttachmentName,
    /// Swaps that stopped in a partial state, keyed by item
    journal: DashMap<ItemId, ReplacementProgress>,
    /// Items with a replacement currently running
    in_flight: DashSet<ItemId>,
}

/// Releases an item's in-flight claim when dropped
struct InFlightClaim<'a> {
    in_flight: &'a DashSet<ItemId>,
    id: ItemId,
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.id);
    }
}

impl ReplaceAttachmentUseCase {
    /// Creates a new ReplaceAttachmentUseCase
    ///
    /// # Arguments
    ///
    /// * `auth` - Source of authenticated store clients
    /// * `stamped_name` - File name for the stamped attachment
    pub fn new(auth: Arc<AuthenticateUseCase>, stamped_name: AttachmentName) -> Self {
        Self {
            auth,
            stamped_name,
            journal: DashMap::new(),
            in_flight: DashSet::new(),
        }
    }

    pub fn stamped_name(&self) -> &AttachmentName {
        &self.stamped_name
    }

    /// Swaps that stopped part-way and will be resumed on the next attempt
    pub fn pending_resumptions(&self) -> Vec<ReplacementProgress> {
        self.journal.iter().map(|e| e.value().clone()).collect()
    }

    /// Replaces the attachment of item `id` with `payload` and marks the item
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::InvalidPayload`] for an empty payload (nothing is sent)
    /// - [`WorkflowError::ReplacementInProgress`] if the item is already being replaced
    /// - [`WorkflowError::UnexpectedAttachments`] unless exactly one attachment is present
    /// - the delete error if both delete attempts fail (item left untouched)
    /// - [`WorkflowError::PartialReplacement`] if the swap stops after the delete
    pub async fn replace(&self, id: ItemId, payload: &[u8]) -> Result<(), WorkflowError> {
        if payload.is_empty() {
            return Err(WorkflowError::InvalidPayload(
                "stamped attachment is empty".to_string(),
            ));
        }
        let _claim = self.claim(id)?;

        let store = self.auth.client().await?;
        let attachments = self
            .auth
            .guard()
            .run("list_attachments", store.list_attachments(id))
            .await?;

        let mut progress = self.resume_or_start(id, attachments)?;
        info!(item = %id, state = %progress.state(), size = payload.len(), "Replacing attachment");

        match self.drive(store.as_ref(), &mut progress, payload).await {
            Ok(()) => {
                self.journal.remove(&id);
                info!(item = %id, "Attachment replaced and item staged for filing");
                Ok(())
            }
            Err(err) if progress.state().is_partial() => {
                let state = progress.state();
                warn!(item = %id, %state, error = %err, "Replacement stopped part-way");
                self.journal.insert(id, progress);
                Err(WorkflowError::PartialReplacement {
                    id,
                    state,
                    source: Box::new(err),
                })
            }
            Err(err) => {
                self.journal.remove(&id);
                Err(err)
            }
        }
    }

    fn claim(&self, id: ItemId) -> Result<InFlightClaim<'_>, WorkflowError> {
        if !self.in_flight.insert(id) {
            return Err(WorkflowError::ReplacementInProgress(id));
        }
        Ok(InFlightClaim {
            in_flight: &self.in_flight,
            id,
        })
    }

    /// Picks up a journaled swap if the store still matches it, otherwise
    /// starts a fresh one from the item's single attachment
    fn resume_or_start(
        &self,
        id: ItemId,
        attachments: Vec<AttachmentInfo>,
    ) -> Result<ReplacementProgress, WorkflowError> {
        if let Some((_, mut recorded)) = self.journal.remove(&id) {
            let holds_replacement =
                attachments.len() == 1 && &attachments[0].file_name == recorded.replacement();
            let matches_store = match recorded.state() {
                ReplacementState::Deleted if holds_replacement => {
                    // The add reached the store but its response was lost
                    info!(item = %id, "Stamped attachment already present, skipping add");
                    recorded.mark_replaced()?;
                    true
                }
                ReplacementState::Deleted => attachments.is_empty(),
                ReplacementState::Replaced => holds_replacement,
                _ => false,
            };

            if matches_store {
                info!(item = %id, state = %recorded.state(), "Resuming interrupted replacement");
                return Ok(recorded);
            }
            warn!(
                item = %id,
                state = %recorded.state(),
                found = attachments.len(),
                "Discarding stale replacement journal entry"
            );
        }

        let current = single_attachment(id, attachments)?;
        Ok(ReplacementProgress::new(
            id,
            current.file_name,
            self.stamped_name.clone(),
        ))
    }

    async fn drive(
        &self,
        store: &dyn IListStore,
        progress: &mut ReplacementProgress,
        payload: &[u8],
    ) -> Result<(), WorkflowError> {
        let id = progress.item_id();

        if progress.state() == ReplacementState::Original {
            let original = progress.original().cloned().ok_or_else(|| {
                WorkflowError::NotFound(format!("original attachment of item {id}"))
            })?;
            self.delete_with_retry(store, id, &original).await?;
            progress.mark_deleted()?;
            debug!(item = %id, file = %original, "Deleted unstamped attachment");
        }

        if progress.state() == ReplacementState::Deleted {
            let name = progress.replacement().clone();
            self.retry_once("add_attachment", id, || {
                store.add_attachment(id, &name, payload)
            })
            .await?;
            progress.mark_replaced()?;
            debug!(item = %id, file = %name, "Added stamped attachment");
        }

        if progress.state() == ReplacementState::Replaced {
            let patch = ItemPatch::staged_for_filing(&Utc::now());
            self.auth
                .guard()
                .run("update_item", store.update_item(id, &patch))
                .await?;
            progress.mark_staged()?;
            debug!(item = %id, "Marked item as staged for filing");
        }

        Ok(())
    }

    /// Deletes `name`, retrying once
    ///
    /// A not-found answer to the retry means the first attempt reached the
    /// store even though its response was lost, so it counts as deleted.
    async fn delete_with_retry(
        &self,
        store: &dyn IListStore,
        id: ItemId,
        name: &AttachmentName,
    ) -> Result<(), WorkflowError> {
        let guard = self.auth.guard();
        match guard
            .run("delete_attachment", store.delete_attachment(id, name))
            .await
        {
            Ok(()) => Ok(()),
            Err(e @ (StoreError::Cancelled | StoreError::NotFound(_))) => Err(e.into()),
            Err(first) => {
                warn!(item = %id, operation = "delete_attachment", error = %first, "Remote call failed, retrying once");
                match guard
                    .run("delete_attachment", store.delete_attachment(id, name))
                    .await
                {
                    Err(StoreError::NotFound(_)) => {
                        info!(item = %id, file = %name, "Attachment already gone on retry, treating as deleted");
                        Ok(())
                    }
                    other => other.map_err(WorkflowError::from),
                }
            }
        }
    }

    /// Runs `call`, repeating the identical call once if it fails
    async fn retry_once<T, F, Fut>(
        &self,
        operation: &'static str,
        id: ItemId,
        mut call: F,
    ) -> Result<T, WorkflowError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let guard = self.auth.guard();
        match guard.run(operation, call()).await {
            Ok(value) => Ok(value),
            Err(e @ (StoreError::Cancelled | StoreError::NotFound(_))) => Err(e.into()),
            Err(first) => {
                warn!(item = %id, operation, error = %first, "Remote call failed, retrying once");
                guard.run(operation, call()).await.map_err(WorkflowError::from)
            }
        }
    }
}
