//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! workflow core. Implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IListStore`] - The remote list-and-attachment store
//! - [`ISessionProvider`] - Authenticated client construction and credential invalidation

pub mod list_store;
pub mod session_provider;

pub use list_store::{odata_literal, IListStore, ItemPatch, ItemQuery, StoreError};
pub use session_provider::ISessionProvider;
