//! End-to-end stamping workflow against a mocked SharePoint site
//!
//! Wires StampService to the real session provider and client with a
//! static token, so every request goes over HTTP to wiremock.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use docstamp_core::domain::ItemId;
use docstamp_core::{StampService, WorkflowError, WorkflowSettings};
use docstamp_sharepoint::credentials::StaticCredentialStore;
use docstamp_sharepoint::SharePointSessionProvider;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

const ORIGINAL: &[u8] = b"%PDF-1.7 unstamped";
const STAMPED: &[u8] = b"%PDF-1.7 stamped";

fn service(server: &MockServer, token: &str) -> StampService {
    let sessions = SharePointSessionProvider::new(
        common::site_url(server),
        common::LIST,
        Arc::new(StaticCredentialStore::new(token)),
    );
    StampService::new(Arc::new(sessions), WorkflowSettings::default())
}

fn pending_item(id: u32) -> serde_json::Value {
    serde_json::json!({ "Id": id, "StagedforFiling": null, "SubmitterName": "Ada" })
}

#[tokio::test]
async fn test_item_12_round_trip_over_http() {
    let (server, _client) = common::setup_sharepoint_mock().await;
    let service = service(&server, common::ACCESS_TOKEN);
    let id = ItemId::new(12).unwrap();

    // First listing shows item 12; once staged it drops out.
    common::list_call("GET", "/items")
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [pending_item(12)]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    common::list_call("GET", "/items")
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": [] })))
        .mount(&server)
        .await;

    common::mount_attachments(&server, 12, &["oath.pdf"]).await;
    common::mount_download(&server, 12, "oath.pdf", ORIGINAL).await;
    common::list_call("DELETE", "/items(12)/AttachmentFiles('oath.pdf')")
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    common::list_call("POST", "/items(12)/AttachmentFiles/add(FileName='stamped.pdf')")
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "FileName": "stamped.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;
    common::list_call("POST", "/items(12)")
        .and(header("X-HTTP-Method", "MERGE"))
        .and(body_string_contains("StagedforFiling"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let identity = service.sign_in().await.unwrap();
    assert_eq!(identity.title, "Records Clerk");

    let pending = service.list_pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, id);

    let downloaded = service.download_attachment(id).await.unwrap();
    assert_eq!(downloaded, STANDARD.encode(ORIGINAL));

    service
        .upload_stamped(id, &STANDARD.encode(STAMPED))
        .await
        .unwrap();

    assert!(service.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_retried_once_over_http() {
    let (server, _client) = common::setup_sharepoint_mock().await;
    let service = service(&server, common::ACCESS_TOKEN);

    common::mount_attachments(&server, 12, &["oath.pdf"]).await;
    common::list_call("DELETE", "/items(12)/AttachmentFiles('oath.pdf')")
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    common::list_call("DELETE", "/items(12)/AttachmentFiles('oath.pdf')")
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    common::list_call("POST", "/items(12)/AttachmentFiles/add(FileName='stamped.pdf')")
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "FileName": "stamped.pdf"
        })))
        .mount(&server)
        .await;
    common::list_call("POST", "/items(12)")
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    service
        .upload_stamped(ItemId::new(12).unwrap(), &STANDARD.encode(STAMPED))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rejected_token_fails_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::web_path("/currentuser")))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let service = service(&server, "revoked-token");
    let err = service.sign_in().await.unwrap_err();
    assert!(matches!(err, WorkflowError::Authentication(_)));
}
