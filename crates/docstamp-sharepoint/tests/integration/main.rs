//! Integration tests for docstamp-sharepoint
//!
//! Uses wiremock to simulate the SharePoint REST API and verifies
//! end-to-end behavior of the SharePointClient, the session provider,
//! and the stamping workflow running on top of them.

mod common;

mod test_attachments;
mod test_current_user;
mod test_items;
mod test_workflow;
