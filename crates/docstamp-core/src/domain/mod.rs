//! Domain entities and business logic
//!
//! This module contains the core domain types for DocStamp:
//! - Newtypes for validated identifiers
//! - Review items, attachments, and the signed-in identity
//! - The attachment replacement state machine
//! - Domain-specific error types

pub mod errors;
pub mod item;
pub mod newtypes;
pub mod replacement;

// Re-export commonly used types
pub use errors::DomainError;
pub use item::{AttachmentInfo, Identity, StampingItem};
pub use newtypes::*;
pub use replacement::{ReplacementProgress, ReplacementState};
