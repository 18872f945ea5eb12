//! Integration tests for list item queries and updates

use std::time::Duration;

use chrono::TimeZone;
use docstamp_core::domain::ItemId;
use docstamp_core::ports::{IListStore, ItemPatch, ItemQuery, StoreError};
use wiremock::matchers::{body_json, header, query_param};
use wiremock::ResponseTemplate;

use crate::common;

const PENDING_FILTER: &str = "StagedforFiling eq null and Filing/Determination eq 'Accepted'";

#[tokio::test]
async fn test_query_items_sends_projection_and_filter() {
    let (server, client) = common::setup_sharepoint_mock().await;

    common::list_call("GET", "/items")
        .and(query_param("$select", "Id,CreationDate,StagedforFiling,SubmitterName"))
        .and(query_param("$filter", PENDING_FILTER))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [
                {
                    "Id": 12,
                    "ID": 12,
                    "CreationDate": "2024-03-01T09:00:00Z",
                    "StagedforFiling": null,
                    "SubmitterName": "Ada Lovelace"
                },
                { "Id": 15, "ID": 15, "StagedforFiling": null }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let items = client
        .query_items(&ItemQuery::pending("Accepted"))
        .await
        .expect("query_items failed");

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id.get(), 12);
    assert_eq!(items[0].submitter_name.as_deref(), Some("Ada Lovelace"));
    assert!(items[0].is_pending());
    assert!(items[1].submitter_name.is_none());
}

#[tokio::test]
async fn test_query_items_escapes_determination() {
    let (server, client) = common::setup_sharepoint_mock().await;

    common::list_call("GET", "/items")
        .and(query_param(
            "$filter",
            "StagedforFiling eq null and Filing/Determination eq 'Clerk''s Hold'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let items = client
        .query_items(&ItemQuery::pending("Clerk's Hold"))
        .await
        .unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_query_items_malformed_payload() {
    let (server, client) = common::setup_sharepoint_mock().await;

    common::list_call("GET", "/items")
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [{ "Id": "twelve" }]
        })))
        .mount(&server)
        .await;

    let err = client
        .query_items(&ItemQuery::pending("Accepted"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_query_items_missing_list() {
    let (server, client) = common::setup_sharepoint_mock().await;

    common::list_call("GET", "/items")
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(common::sharepoint_error("List does not exist.")),
        )
        .mount(&server)
        .await;

    let err = client
        .query_items(&ItemQuery::pending("Accepted"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(msg) if msg == "List does not exist."));
}

#[tokio::test]
async fn test_query_items_throttled() {
    let (server, client) = common::setup_sharepoint_mock().await;

    common::list_call("GET", "/items")
        .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "12"))
        .mount(&server)
        .await;

    let err = client
        .query_items(&ItemQuery::pending("Accepted"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::TooManyRequests { retry_after } if retry_after == Duration::from_secs(12)
    ));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_update_item_merges_staging_timestamp() {
    let (server, client) = common::setup_sharepoint_mock().await;

    common::list_call("POST", "/items(12)")
        .and(header("X-HTTP-Method", "MERGE"))
        .and(header("IF-MATCH", "*"))
        .and(body_json(serde_json::json!({
            "StagedforFiling": "2024-05-06T07:08:09Z"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let ts = chrono::Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
    client
        .update_item(ItemId::new(12).unwrap(), &ItemPatch::staged_for_filing(&ts))
        .await
        .expect("update_item failed");
}

#[tokio::test]
async fn test_update_item_server_error() {
    let (server, client) = common::setup_sharepoint_mock().await;

    common::list_call("POST", "/items(12)")
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ts = chrono::Utc::now();
    let err = client
        .update_item(ItemId::new(12).unwrap(), &ItemPatch::staged_for_filing(&ts))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ServerError(_)));
}
