//! Attachment replacement state machine
//!
//! Swapping an item's attachment touches two remote resources (the
//! attachment collection and the item's metadata) with no atomic commit.
//! [`ReplacementProgress`] records the last confirmed step so an
//! interrupted swap can be resumed instead of restarted.
//!
//! ```text
//! Original --delete--> Deleted --add--> Replaced --mark--> Marked
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{AttachmentName, ItemId};

/// Last confirmed step of an attachment swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementState {
    /// The unstamped attachment is still in place
    Original,
    /// The unstamped attachment was deleted; the item has no attachment
    Deleted,
    /// The stamped attachment was added; the item is not yet marked
    Replaced,
    /// The item's staging timestamp was set; the swap is complete
    Marked,
}

impl ReplacementState {
    /// Returns the state name as a static string
    pub fn name(&self) -> &'static str {
        match self {
            ReplacementState::Original => "original",
            ReplacementState::Deleted => "deleted",
            ReplacementState::Replaced => "replaced",
            ReplacementState::Marked => "marked",
        }
    }

    /// The single state reachable from this one, if any
    pub fn next(&self) -> Option<ReplacementState> {
        match self {
            ReplacementState::Original => Some(ReplacementState::Deleted),
            ReplacementState::Deleted => Some(ReplacementState::Replaced),
            ReplacementState::Replaced => Some(ReplacementState::Marked),
            ReplacementState::Marked => None,
        }
    }

    /// Returns true if the remote store has been mutated but the swap is not complete
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            ReplacementState::Deleted | ReplacementState::Replaced
        )
    }

    /// Returns true once the swap is complete
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReplacementState::Marked)
    }
}

impl std::fmt::Display for ReplacementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Progress of one attachment swap on one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementProgress {
    item_id: ItemId,
    /// Name of the attachment being replaced (unknown when resuming from `Deleted`)
    original: Option<AttachmentName>,
    /// Name the stamped attachment is stored under
    replacement: AttachmentName,
    state: ReplacementState,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReplacementProgress {
    /// Starts tracking a swap of `original` for `replacement` on `item_id`
    pub fn new(item_id: ItemId, original: AttachmentName, replacement: AttachmentName) -> Self {
        let now = Utc::now();
        Self {
            item_id,
            original: Some(original),
            replacement,
            state: ReplacementState::Original,
            started_at: now,
            updated_at: now,
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn original(&self) -> Option<&AttachmentName> {
        self.original.as_ref()
    }

    pub fn replacement(&self) -> &AttachmentName {
        &self.replacement
    }

    pub fn state(&self) -> ReplacementState {
        self.state
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Checks whether `target` is the next step of the swap
    pub fn can_transition_to(&self, target: ReplacementState) -> bool {
        self.state.next() == Some(target)
    }

    /// Records that `target` has been confirmed by the remote store
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidState`] for anything but the next step
    pub fn transition_to(&mut self, target: ReplacementState) -> Result<(), DomainError> {
        if !self.can_transition_to(target) {
            return Err(DomainError::InvalidState {
                from: self.state.name().to_string(),
                to: target.name().to_string(),
            });
        }
        self.state = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_deleted(&mut self) -> Result<(), DomainError> {
        self.transition_to(ReplacementState::Deleted)
    }

    pub fn mark_replaced(&mut self) -> Result<(), DomainError> {
        self.transition_to(ReplacementState::Replaced)
    }

    pub fn mark_staged(&mut self) -> Result<(), DomainError> {
        self.transition_to(ReplacementState::Marked)
    }
}
