//! Integration tests for the identity probe

use docstamp_core::ports::{IListStore, StoreError};
use docstamp_sharepoint::client::SharePointClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_current_user_returns_identity() {
    let (_server, client) = common::setup_sharepoint_mock().await;

    let me = client.current_user().await.expect("current_user failed");

    assert_eq!(me.id, 14);
    assert_eq!(me.title, "Records Clerk");
    assert_eq!(me.email.as_deref(), Some("clerk@example.gov"));
    assert_eq!(me.login_name, "i:0#.f|membership|clerk@example.gov");
}

#[tokio::test]
async fn test_current_user_verbose_dialect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::web_path("/currentuser")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "d": {
                "__metadata": { "type": "SP.User" },
                "Id": 3,
                "Title": "Verbose User",
                "LoginName": "i:0#.f|membership|v@example.gov"
            }
        })))
        .mount(&server)
        .await;

    let client = SharePointClient::new("t", &common::site_url(&server), common::LIST).unwrap();
    let me = client.current_user().await.unwrap();
    assert_eq!(me.title, "Verbose User");
    assert!(me.email.is_none());
}

#[tokio::test]
async fn test_current_user_rejected_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::web_path("/currentuser")))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error_description": "Invalid JWT token. The token is expired."
        })))
        .mount(&server)
        .await;

    let client = SharePointClient::new("expired", &common::site_url(&server), common::LIST).unwrap();
    let err = client.current_user().await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized(_)));
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let server = MockServer::start().await;
    let site = common::site_url(&server);
    drop(server);

    let client = SharePointClient::new("t", &site, common::LIST).unwrap();
    let err = client.current_user().await.unwrap_err();
    assert!(matches!(err, StoreError::Network(_)));
    assert!(err.is_transient());
}
