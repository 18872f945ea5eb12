//! Integration tests for attachment listing, transfer, and replacement calls

use docstamp_core::domain::{AttachmentName, ItemId};
use docstamp_core::ports::{IListStore, StoreError};
use wiremock::matchers::{body_bytes, header};
use wiremock::ResponseTemplate;

use crate::common;

fn item(id: u32) -> ItemId {
    ItemId::new(id).unwrap()
}

fn name(value: &str) -> AttachmentName {
    AttachmentName::new(value).unwrap()
}

#[tokio::test]
async fn test_list_attachments() {
    let (server, client) = common::setup_sharepoint_mock().await;
    common::mount_attachments(&server, 12, &["oath.pdf"]).await;

    let files = client.list_attachments(item(12)).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name.as_str(), "oath.pdf");
    assert_eq!(
        files[0].server_relative_url.as_deref(),
        Some("/sites/DOS/corp/Data/Lists/OathOfOfficeReviews1/Attachments/12/oath.pdf")
    );
}

#[tokio::test]
async fn test_list_attachments_empty() {
    let (server, client) = common::setup_sharepoint_mock().await;
    common::mount_attachments(&server, 4, &[]).await;

    assert!(client.list_attachments(item(4)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_download_attachment_returns_content() {
    let (server, client) = common::setup_sharepoint_mock().await;
    let content = b"%PDF-1.7 oath of office";
    common::mount_download(&server, 12, "oath.pdf", content).await;

    let data = client
        .download_attachment(item(12), &name("oath.pdf"))
        .await
        .expect("download failed");
    assert_eq!(data, content);
}

#[tokio::test]
async fn test_download_large_attachment() {
    let (server, client) = common::setup_sharepoint_mock().await;
    let content: Vec<u8> = (0..1_048_576).map(|i| (i % 256) as u8).collect();
    common::mount_download(&server, 12, "scan.pdf", &content).await;

    let data = client
        .download_attachment(item(12), &name("scan.pdf"))
        .await
        .unwrap();
    assert_eq!(data.len(), 1_048_576);
    assert_eq!(data, content);
}

#[tokio::test]
async fn test_download_missing_attachment() {
    let (server, client) = common::setup_sharepoint_mock().await;
    common::list_call("GET", "/items(12)/AttachmentFiles('gone.pdf')/$value")
        .respond_with(
            ResponseTemplate::new(404).set_body_json(common::sharepoint_error("File Not Found.")),
        )
        .mount(&server)
        .await;

    let err = client
        .download_attachment(item(12), &name("gone.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_attachment_sends_if_match() {
    let (server, client) = common::setup_sharepoint_mock().await;
    common::list_call("DELETE", "/items(12)/AttachmentFiles('oath.pdf')")
        .and(header("IF-MATCH", "*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .delete_attachment(item(12), &name("oath.pdf"))
        .await
        .expect("delete failed");
}

#[tokio::test]
async fn test_delete_attachment_with_quote_in_name() {
    let (server, client) = common::setup_sharepoint_mock().await;
    common::list_call("DELETE", "/items(7)/AttachmentFiles('O''Brien.pdf')")
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .delete_attachment(item(7), &name("O'Brien.pdf"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_missing_attachment_is_not_found() {
    let (server, client) = common::setup_sharepoint_mock().await;
    common::list_call("DELETE", "/items(12)/AttachmentFiles('oath.pdf')")
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client
        .delete_attachment(item(12), &name("oath.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_add_attachment_posts_raw_body() {
    let (server, client) = common::setup_sharepoint_mock().await;
    let content = b"%PDF-1.7 stamped";
    common::list_call("POST", "/items(12)/AttachmentFiles/add(FileName='stamped.pdf')")
        .and(body_bytes(content.to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "FileName": "stamped.pdf",
            "ServerRelativeUrl": "/sites/DOS/corp/Data/Lists/OathOfOfficeReviews1/Attachments/12/stamped.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let added = client
        .add_attachment(item(12), &name("stamped.pdf"), content)
        .await
        .expect("add failed");
    assert_eq!(added.file_name.as_str(), "stamped.pdf");
    assert!(added.server_relative_url.is_some());
}

#[tokio::test]
async fn test_add_attachment_tolerates_empty_body() {
    let (server, client) = common::setup_sharepoint_mock().await;
    common::list_call("POST", "/items(12)/AttachmentFiles/add(FileName='stamped.pdf')")
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let added = client
        .add_attachment(item(12), &name("stamped.pdf"), b"pdf")
        .await
        .unwrap();
    assert_eq!(added.file_name.as_str(), "stamped.pdf");
    assert!(added.server_relative_url.is_none());
}

#[tokio::test]
async fn test_add_existing_attachment_conflicts() {
    let (server, client) = common::setup_sharepoint_mock().await;
    common::list_call("POST", "/items(12)/AttachmentFiles/add(FileName='stamped.pdf')")
        .respond_with(ResponseTemplate::new(409).set_body_json(common::sharepoint_error(
            "A file with the name stamped.pdf already exists.",
        )))
        .mount(&server)
        .await;

    let err = client
        .add_attachment(item(12), &name("stamped.pdf"), b"pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(msg) if msg.contains("already exists")));
}
