//! Attachment download use case

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::ItemId;
use crate::error::WorkflowError;

use super::authenticate::AuthenticateUseCase;
use super::single_attachment;

/// Use case for fetching an item's current attachment
///
/// Downloads are idempotent and cheap to repeat, so nothing here retries.
pub struct DownloadAttachmentUseCase {
    auth: Arc<AuthenticateUseCase>,
}

impl DownloadAttachmentUseCase {
    pub fn new(auth: Arc<AuthenticateUseCase>) -> Self {
        Self { auth }
    }

    /// Downloads the single attachment of item `id`
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::NotFound`] if the item or attachment is missing
    /// - [`WorkflowError::UnexpectedAttachments`] unless exactly one attachment is present
    /// - the classified store error if the transfer fails
    pub async fn download(&self, id: ItemId) -> Result<Vec<u8>, WorkflowError> {
        let store = self.auth.client().await?;
        let guard = self.auth.guard();

        let attachments = guard
            .run("list_attachments", store.list_attachments(id))
            .await?;
        let attachment = single_attachment(id, attachments)?;

        debug!(item = %id, file = %attachment.file_name, "Downloading attachment");
        let data = guard
            .run(
                "download_attachment",
                store.download_attachment(id, &attachment.file_name),
            )
            .await?;

        info!(item = %id, size = data.len(), "Downloaded attachment");
        Ok(data)
    }
}
