//! SharePoint REST client
//!
//! Provides a typed HTTP client for one list on one SharePoint site.
//! Handles authentication headers, URL construction, OData payload
//! normalisation, and status classification.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docstamp_core::ports::IListStore;
//! use docstamp_sharepoint::client::SharePointClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = SharePointClient::new(
//!     "access-token-here",
//!     "https://contoso.sharepoint.com/sites/Reviews",
//!     "Lists/Filings",
//! )?;
//! let me = client.current_user().await?;
//! println!("Hello, {}", me.title);
//! # Ok(())
//! # }
//! ```

use docstamp_core::domain::{AttachmentInfo, AttachmentName, Identity, ItemId, StampingItem};
use docstamp_core::ports::{odata_literal, IListStore, ItemPatch, ItemQuery, StoreError};
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{status_error, transport_error};
use crate::odata;

/// Accept header asking for the light JSON dialect
const ACCEPT_JSON: &str = "application/json;odata=nometadata";

/// Query alias carrying the server-relative list URL
const LIST_ALIAS: &str = "@list";

// ============================================================================
// SharePointClient
// ============================================================================

/// HTTP client for the SharePoint REST API, bound to one list
///
/// Wraps `reqwest::Client` with the bearer token and URL construction for
/// `{site}/_api/web/GetList(...)`.
#[derive(Clone)]
pub struct SharePointClient {
    /// The underlying HTTP client
    client: Client,
    /// Absolute URL of the site (web)
    site_url: Url,
    /// Server-relative URL of the list
    list_url: String,
    /// Current OAuth2 access token
    access_token: String,
}

impl std::fmt::Debug for SharePointClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharePointClient")
            .field("site_url", &self.site_url.as_str())
            .field("list_url", &self.list_url)
            .finish_non_exhaustive()
    }
}

impl SharePointClient {
    /// Creates a new SharePointClient
    ///
    /// # Arguments
    /// * `access_token` - A valid OAuth2 access token for the site's origin
    /// * `site_url` - Absolute URL of the site hosting the list
    /// * `list` - Web-relative URL of the list, e.g. `Lists/Reviews`
    pub fn new(
        access_token: impl Into<String>,
        site_url: &str,
        list: &str,
    ) -> Result<Self, StoreError> {
        let site_url = Url::parse(site_url)
            .map_err(|e| StoreError::Rejected(format!("invalid site URL '{site_url}': {e}")))?;
        if site_url.cannot_be_a_base() {
            return Err(StoreError::Rejected(format!(
                "site URL cannot carry a path: {site_url}"
            )));
        }
        let list_url = format!(
            "{}/{}",
            site_url.path().trim_end_matches('/'),
            list.trim_matches('/')
        );

        Ok(Self {
            client: Client::new(),
            site_url,
            list_url,
            access_token: access_token.into(),
        })
    }

    /// Replaces the HTTP client, sharing its connection pool
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Returns a reference to the current access token
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Server-relative URL of the bound list
    pub fn list_url(&self) -> &str {
        &self.list_url
    }

    pub fn site_url(&self) -> &Url {
        &self.site_url
    }

    /// Builds `{site}/_api/web/{segments...}`
    ///
    /// Each segment is percent-encoded as a single path segment.
    pub fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.site_url.clone();
        url.set_query(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("_api").push("web").extend(segments);
        }
        url
    }

    /// Builds `{site}/_api/web/GetList(@list)/{segments...}?@list='{list}'`
    pub fn list_api_url(&self, segments: &[&str]) -> Url {
        let mut all = Vec::with_capacity(segments.len() + 1);
        all.push("GetList(@list)");
        all.extend_from_slice(segments);
        let mut url = self.api_url(&all);
        url.query_pairs_mut()
            .append_pair(LIST_ALIAS, &odata_literal(&self.list_url));
        url
    }

    /// Creates an authenticated request builder for the given method and URL
    ///
    /// Adds the Authorization and Accept headers.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, HeaderValue::from_static(ACCEPT_JSON))
    }

    /// Sends `request`, classifying transport failures and error statuses
    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(operation, status = status.as_u16(), url = %response.url(), "SharePoint call");

        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, retry_after.as_deref(), &body))
    }

    async fn get_bytes(&self, operation: &'static str, url: Url) -> Result<Vec<u8>, StoreError> {
        let response = self.send(operation, self.request(Method::GET, url)).await?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }

    async fn get_collection<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: Url,
    ) -> Result<Vec<T>, StoreError> {
        let body = self.get_bytes(operation, url).await?;
        odata::parse_collection(&body)
            .map_err(|e| StoreError::InvalidResponse(format!("{operation}: {e}")))
    }

    fn item_segment(id: ItemId) -> String {
        format!("items({id})")
    }

    fn attachment_segment(name: &AttachmentName) -> String {
        format!("AttachmentFiles({})", odata_literal(name.as_str()))
    }
}

#[async_trait::async_trait]
impl IListStore for SharePointClient {
    async fn current_user(&self) -> Result<Identity, StoreError> {
        let body = self
            .get_bytes("current_user", self.api_url(&["currentuser"]))
            .await?;
        odata::parse_entity(&body)
            .map_err(|e| StoreError::InvalidResponse(format!("current_user: {e}")))
    }

    async fn query_items(&self, query: &ItemQuery) -> Result<Vec<StampingItem>, StoreError> {
        let mut url = self.list_api_url(&["items"]);
        {
            let mut pairs = url.query_pairs_mut();
            if !query.select.is_empty() {
                pairs.append_pair("$select", &query.select.join(","));
            }
            if let Some(filter) = &query.filter {
                pairs.append_pair("$filter", filter);
            }
        }
        self.get_collection("query_items", url).await
    }

    async fn list_attachments(&self, id: ItemId) -> Result<Vec<AttachmentInfo>, StoreError> {
        let item = Self::item_segment(id);
        let url = self.list_api_url(&[&item, "AttachmentFiles"]);
        self.get_collection("list_attachments", url).await
    }

    async fn download_attachment(
        &self,
        id: ItemId,
        name: &AttachmentName,
    ) -> Result<Vec<u8>, StoreError> {
        let item = Self::item_segment(id);
        let file = Self::attachment_segment(name);
        let url = self.list_api_url(&[&item, &file, "$value"]);
        let data = self.get_bytes("download_attachment", url).await?;
        debug!(item = %id, file = %name, size = data.len(), "Downloaded attachment content");
        Ok(data)
    }

    async fn delete_attachment(&self, id: ItemId, name: &AttachmentName) -> Result<(), StoreError> {
        let item = Self::item_segment(id);
        let file = Self::attachment_segment(name);
        let url = self.list_api_url(&[&item, &file]);
        let request = self.request(Method::DELETE, url).header("IF-MATCH", "*");
        self.send("delete_attachment", request).await?;
        Ok(())
    }

    async fn add_attachment(
        &self,
        id: ItemId,
        name: &AttachmentName,
        data: &[u8],
    ) -> Result<AttachmentInfo, StoreError> {
        let item = Self::item_segment(id);
        let add = format!("add(FileName={})", odata_literal(name.as_str()));
        let url = self.list_api_url(&[&item, "AttachmentFiles", &add]);
        let request = self
            .request(Method::POST, url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data.to_vec());
        let response = self.send("add_attachment", request).await?;
        let body = response.bytes().await.map_err(transport_error)?;

        // An empty or unexpected body still means the file was stored
        Ok(odata::parse_entity(&body).unwrap_or_else(|_| AttachmentInfo {
            file_name: name.clone(),
            server_relative_url: None,
        }))
    }

    async fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<(), StoreError> {
        let item = Self::item_segment(id);
        let url = self.list_api_url(&[&item]);
        let request = self
            .request(Method::POST, url)
            .header("X-HTTP-Method", "MERGE")
            .header("IF-MATCH", "*")
            .json(&patch.to_json());
        self.send("update_item", request).await?;
        Ok(())
    }
}
