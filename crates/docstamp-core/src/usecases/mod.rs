//! Use cases (interactors) for DocStamp
//!
//! This module contains the workflow use cases that orchestrate domain
//! entities and port interfaces. Use cases are thin coordinators that
//! delegate business rules to domain methods and I/O to ports.
//!
//! ## Use Cases
//!
//! - [`AuthenticateUseCase`] - Authenticated clients and identity verification
//! - [`LoadPendingUseCase`] - Items awaiting stamping
//! - [`DownloadAttachmentUseCase`] - An item's current attachment
//! - [`ReplaceAttachmentUseCase`] - Attachment swap and staging mark

pub mod authenticate;
pub mod download_attachment;
pub mod guard;
pub mod load_pending;
pub mod replace_attachment;

pub use authenticate::AuthenticateUseCase;
pub use download_attachment::DownloadAttachmentUseCase;
pub use guard::CallGuard;
pub use load_pending::LoadPendingUseCase;
pub use replace_attachment::ReplaceAttachmentUseCase;

use crate::domain::{AttachmentInfo, ItemId};
use crate::error::WorkflowError;

/// Returns the item's only attachment
///
/// Items carry exactly one attachment; zero or several is reported instead
/// of picking an arbitrary one.
fn single_attachment(
    id: ItemId,
    mut attachments: Vec<AttachmentInfo>,
) -> Result<AttachmentInfo, WorkflowError> {
    match attachments.len() {
        1 => Ok(attachments.remove(0)),
        found => Err(WorkflowError::UnexpectedAttachments { id, found }),
    }
}
