//! Error responses over the wire, and connection survival after them.

use serde_json::json;

use crate::testing::{TestClient, start_test_server};
use crate::wire::{Request, Status};

#[tokio::test]
async fn parse_error_is_answered_and_connection_stays_open() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    let response = client.send_raw("{this is not json").await;
    assert_eq!(response.status, Status::Error);
    assert!(response.message.starts_with("Server error:"));

    // The same connection keeps working.
    let response = client
        .request(&Request::insert("users", vec![json!({"ok": true})]))
        .await;
    assert_eq!(response.status, Status::Success);
}

#[tokio::test]
async fn every_request_gets_exactly_one_response() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    // A mix of good and bad frames, in order; responses must arrive in
    // the same order.
    let r1 = client
        .request(&Request::insert("users", vec![json!({"n": 1})]))
        .await;
    assert_eq!(r1.status, Status::Success);

    let r2 = client.send_raw("[]").await;
    assert_eq!(r2.status, Status::Error);

    let r3 = client
        .request(&Request {
            database: Some("users".to_string()),
            operation: Some("nope".to_string()),
            ..Request::default()
        })
        .await;
    assert_eq!(r3.message, "Unknown operation: nope");

    let r4 = client.request(&Request::find("users", json!({}))).await;
    assert_eq!(r4.count, Some(1));
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    let response = client.send_raw(r#"{"operation": "find"}"#).await;
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.message, "Invalid request format");

    let response = client.send_raw(r#"{"database": "users"}"#).await;
    assert_eq!(response.message, "Invalid request format");

    let response = client
        .send_raw(r#"{"database": "users", "operation": "find"}"#)
        .await;
    assert_eq!(response.message, "Find operation requires query");
}
