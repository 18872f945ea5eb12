//! Workflow façade
//!
//! [`StampService`] is the only surface the UI collaborator drives. It owns
//! the use cases, shares one [`AuthenticateUseCase`] and one cancellation
//! token between them, and converts payloads to and from base64 text at the
//! boundary. Everything else is delegation.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::{AttachmentName, Identity, ItemId, ReplacementProgress, StampingItem};
use crate::error::WorkflowError;
use crate::ports::ISessionProvider;
use crate::usecases::guard::DEFAULT_CALL_DEADLINE;
use crate::usecases::{
    AuthenticateUseCase, CallGuard, DownloadAttachmentUseCase, LoadPendingUseCase,
    ReplaceAttachmentUseCase,
};

/// Tunables the façade hands to its use cases
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Deadline for each individual remote call
    pub call_deadline: Duration,
    /// Filing determination an item needs to be pending
    pub determination: String,
    /// Name the stamped attachment is stored under
    pub stamped_file_name: AttachmentName,
}

impl WorkflowSettings {
    /// Derives settings from the `site` and `workflow` config sections
    pub fn from_config(config: &Config) -> Result<Self, WorkflowError> {
        Ok(Self {
            call_deadline: config.site.request_timeout(),
            determination: config.workflow.determination.clone(),
            stamped_file_name: AttachmentName::new(config.workflow.stamped_file_name.clone())?,
        })
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            call_deadline: DEFAULT_CALL_DEADLINE,
            determination: "Accepted".to_string(),
            stamped_file_name: AttachmentName::stamped_default(),
        }
    }
}

/// The stamping workflow exposed to the UI collaborator
pub struct StampService {
    auth: Arc<AuthenticateUseCase>,
    pending: LoadPendingUseCase,
    download: DownloadAttachmentUseCase,
    replace: ReplaceAttachmentUseCase,
    cancel: CancellationToken,
}

impl StampService {
    pub fn new(sessions: Arc<dyn ISessionProvider>, settings: WorkflowSettings) -> Self {
        let cancel = CancellationToken::new();
        let guard = CallGuard::new(settings.call_deadline, cancel.clone());
        let auth = Arc::new(AuthenticateUseCase::new(sessions, guard));

        debug!(
            deadline_ms = settings.call_deadline.as_millis() as u64,
            determination = %settings.determination,
            stamped = %settings.stamped_file_name,
            "Creating stamp service"
        );

        Self {
            pending: LoadPendingUseCase::new(Arc::clone(&auth), &settings.determination),
            download: DownloadAttachmentUseCase::new(Arc::clone(&auth)),
            replace: ReplaceAttachmentUseCase::new(Arc::clone(&auth), settings.stamped_file_name),
            auth,
            cancel,
        }
    }

    /// Builds a service from loaded configuration
    pub fn from_config(
        sessions: Arc<dyn ISessionProvider>,
        config: &Config,
    ) -> Result<Self, WorkflowError> {
        Ok(Self::new(sessions, WorkflowSettings::from_config(config)?))
    }

    /// Items that passed review and are not yet staged for filing
    pub async fn list_pending(&self) -> Result<Vec<StampingItem>, WorkflowError> {
        self.pending.load_pending().await
    }

    /// The item's single attachment, base64-encoded
    pub async fn download_attachment(&self, id: ItemId) -> Result<String, WorkflowError> {
        let data = self.download.download(id).await?;
        Ok(STANDARD.encode(data))
    }

    /// Replaces the item's attachment with the base64-encoded stamped
    /// document and stages the item for filing
    ///
    /// Invalid base64 is rejected before any remote call is made.
    pub async fn upload_stamped(&self, id: ItemId, payload_base64: &str) -> Result<(), WorkflowError> {
        let payload = STANDARD
            .decode(payload_base64.trim())
            .map_err(|e| WorkflowError::InvalidPayload(format!("not valid base64: {e}")))?;
        self.replace.replace(id, &payload).await
    }

    /// Verifies the signed-in identity, re-authenticating once if needed
    pub async fn sign_in(&self) -> Result<Identity, WorkflowError> {
        let identity = self.auth.verify().await?;
        info!(user = %identity.title, "Signed in");
        Ok(identity)
    }

    /// Aborts in-flight calls and fails every later one with
    /// [`WorkflowError::Cancelled`]
    pub fn cancel(&self) {
        info!("Cancelling stamp service");
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Replacements that stopped part-way and resume on the next upload
    pub fn pending_replacements(&self) -> Vec<ReplacementProgress> {
        self.replace.pending_resumptions()
    }
}
