//! Stamping workflow records
//!
//! Field names follow the internal column names of the review list, so the
//! same types deserialize straight from the remote store's JSON payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{AttachmentName, ItemId};

/// One review record awaiting (or past) the stamping step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampingItem {
    /// Identifier assigned by the remote store
    #[serde(rename = "Id")]
    pub id: ItemId,
    /// When the review record was created (informational)
    #[serde(rename = "CreationDate", default)]
    pub creation_date: Option<String>,
    /// Set once the stamped attachment has been committed; `None` while pending
    #[serde(rename = "StagedforFiling", default)]
    pub staged_for_filing: Option<DateTime<Utc>>,
    /// Name of the person who submitted the document
    #[serde(rename = "SubmitterName", default)]
    pub submitter_name: Option<String>,
    /// Text the external stamping step renders onto the document
    #[serde(rename = "StampText", default)]
    pub stamp_text: Option<String>,
    /// Local selection flag owned by the UI; never sent to the store
    #[serde(rename = "Selected", default)]
    pub selected: bool,
}

impl StampingItem {
    /// Returns true while the item has not been staged for filing
    pub fn is_pending(&self) -> bool {
        self.staged_for_filing.is_none()
    }
}

/// An attachment file as listed on an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    /// Attachment file name, unique per item
    #[serde(rename = "FileName")]
    pub file_name: AttachmentName,
    /// Server-relative URL of the attachment file
    #[serde(rename = "ServerRelativeUrl", default)]
    pub server_relative_url: Option<String>,
}

/// The signed-in user as reported by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Site-scoped user ID
    #[serde(rename = "Id")]
    pub id: i64,
    /// Display name
    #[serde(rename = "Title", default)]
    pub title: String,
    /// E-mail address, when the directory has one
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    /// Claims-encoded login name
    #[serde(rename = "LoginName", default)]
    pub login_name: String,
}
