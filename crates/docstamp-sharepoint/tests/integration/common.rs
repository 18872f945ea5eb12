//! Shared test helpers for SharePoint REST integration tests
//!
//! Provides wiremock-based mock server setup for the SharePoint endpoints
//! the adapter uses. Each helper mounts the necessary mock endpoints and
//! returns a client pointing at the mock server.

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docstamp_sharepoint::client::SharePointClient;

pub const ACCESS_TOKEN: &str = "test-access-token";
pub const SITE_PATH: &str = "/sites/DOS/corp/Data";
pub const LIST: &str = "Lists/OathOfOfficeReviews1";

/// Value of the `@list` alias the client sends with every list call
pub const LIST_ALIAS: &str = "'/sites/DOS/corp/Data/Lists/OathOfOfficeReviews1'";

/// Path of a web-level endpoint, e.g. `web_path("/currentuser")`
pub fn web_path(rest: &str) -> String {
    format!("{SITE_PATH}/_api/web{rest}")
}

/// Path of a list-level endpoint, e.g. `list_path("/items(12)")`
pub fn list_path(rest: &str) -> String {
    format!("{SITE_PATH}/_api/web/GetList(@list){rest}")
}

pub fn site_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), SITE_PATH)
}

/// A mock builder for a list-level endpoint carrying the list alias and token
pub fn list_call(http_method: &str, rest: &str) -> wiremock::MockBuilder {
    Mock::given(method(http_method))
        .and(path(list_path(rest)))
        .and(query_param("@list", LIST_ALIAS))
        .and(header("Authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
}

/// Sets up a mock server with the identity endpoint and returns a
/// (MockServer, SharePointClient) tuple.
///
/// Pre-configured endpoints:
/// - GET /_api/web/currentuser → signed-in user
pub async fn setup_sharepoint_mock() -> (MockServer, SharePointClient) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(web_path("/currentuser")))
        .and(header("Authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Id": 14,
            "Title": "Records Clerk",
            "Email": "clerk@example.gov",
            "LoginName": "i:0#.f|membership|clerk@example.gov",
            "IsSiteAdmin": false
        })))
        .mount(&server)
        .await;

    let client = SharePointClient::new(ACCESS_TOKEN, &site_url(&server), LIST)
        .expect("client for mock server");

    (server, client)
}

/// Mounts an attachment listing for one item
pub async fn mount_attachments(server: &MockServer, id: u32, names: &[&str]) {
    let files: Vec<serde_json::Value> = names
        .iter()
        .map(|name| {
            serde_json::json!({
                "FileName": name,
                "ServerRelativeUrl": format!("{SITE_PATH}/{LIST}/Attachments/{id}/{name}")
            })
        })
        .collect();

    list_call("GET", &format!("/items({id})/AttachmentFiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": files })))
        .mount(server)
        .await;
}

/// Mounts the raw content of one attachment
pub async fn mount_download(server: &MockServer, id: u32, name: &str, content: &[u8]) {
    list_call("GET", &format!("/items({id})/AttachmentFiles('{name}')/$value"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(content.to_vec())
                .append_header("Content-Type", "application/octet-stream"),
        )
        .mount(server)
        .await;
}

/// Error body in the light OData dialect
pub fn sharepoint_error(message: &str) -> serde_json::Value {
    serde_json::json!({
        "odata.error": {
            "code": "-2130575338, Microsoft.SharePoint.SPException",
            "message": { "lang": "en-US", "value": message }
        }
    })
}
