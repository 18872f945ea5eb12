//! DocStamp SharePoint - SharePoint Online REST adapter
//!
//! Provides async adapters for:
//! - OAuth2 authentication (Authorization Code with PKCE), cached in the OS keyring
//! - List item queries, attachment transfer, and item updates via the REST API
//!
//! ## Modules
//!
//! - [`auth`] - OAuth2 PKCE authentication flow components
//! - [`client`] - SharePoint REST client implementing `IListStore`
//! - [`credentials`] - Credential strategies (keyring/OAuth and static token)
//! - [`session`] - `ISessionProvider` implementation
//! - [`odata`] - OData JSON dialect handling

pub mod auth;
pub mod client;
pub mod credentials;
mod error;
pub mod odata;
pub mod session;

pub use client::SharePointClient;
pub use error::parse_retry_after;
pub use session::SharePointSessionProvider;
