//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for the identifiers the workflow passes around.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// ItemId
// ============================================================================

/// Identifier of a list item, assigned by the remote store
///
/// SharePoint list item IDs are positive 32-bit integers starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ItemId(u32);

impl ItemId {
    /// Create a new ItemId
    ///
    /// # Errors
    /// Returns error if the ID is zero
    pub fn new(id: u32) -> Result<Self, DomainError> {
        if id == 0 {
            return Err(DomainError::InvalidItemId(
                "Item ID must be greater than 0".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the raw integer value
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .trim()
            .parse::<u32>()
            .map_err(|e| DomainError::InvalidItemId(format!("{s}: {e}")))?;
        Self::new(raw)
    }
}

impl TryFrom<u32> for ItemId {
    type Error = DomainError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<ItemId> for u32 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

// ============================================================================
// AttachmentName
// ============================================================================

/// Default file name for stamped attachments
pub const DEFAULT_STAMPED_NAME: &str = "stamped.pdf";

/// File name of an item attachment
///
/// Attachment names are flat: they may not be empty, contain path
/// separators, or be the relative path components `.` and `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttachmentName(String);

impl AttachmentName {
    /// Create a new AttachmentName
    ///
    /// # Errors
    /// Returns error if the name is empty or not a flat file name
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidAttachmentName(
                "Attachment name cannot be empty".to_string(),
            ));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(DomainError::InvalidAttachmentName(format!(
                "Attachment name contains a path separator: {name}"
            )));
        }
        if name == "." || name == ".." {
            return Err(DomainError::InvalidAttachmentName(format!(
                "Attachment name is a relative path component: {name}"
            )));
        }
        Ok(Self(name))
    }

    /// The name stamped documents are stored under unless configured otherwise
    #[must_use]
    pub fn stamped_default() -> Self {
        Self(DEFAULT_STAMPED_NAME.to_string())
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AttachmentName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AttachmentName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AttachmentName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<AttachmentName> for String {
    fn from(name: AttachmentName) -> Self {
        name.0
    }
}
