//! Insert a document, then fetch it back by field equality.

use serde_json::json;

use crate::testing::{TestClient, start_test_server};
use crate::wire::{Request, Status};

#[tokio::test]
async fn insert_then_find_returns_the_document() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    let response = client
        .request(&Request::insert(
            "users",
            vec![json!({"name": "Alice", "age": 25})],
        ))
        .await;
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.count, Some(1));

    let ids = response.data.expect("insert returns ids");
    let id = ids[0].as_str().expect("id is a string");
    assert!(!id.is_empty());
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));

    let response = client
        .request(&Request::find("users", json!({"name": "Alice"})))
        .await;
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.count, Some(1));

    let docs = response.data.expect("find returns documents");
    assert_eq!(docs[0]["_id"], json!(id));
    assert_eq!(docs[0]["name"], json!("Alice"));
    assert_eq!(docs[0]["age"], json!(25));
}

#[tokio::test]
async fn find_on_missing_value_returns_empty() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert("users", vec![json!({"name": "Alice"})]))
        .await;

    let response = client
        .request(&Request::find("users", json!({"name": "Nobody"})))
        .await;
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.count, Some(0));
}

#[tokio::test]
async fn batch_insert_returns_all_ids() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    let response = client
        .request(&Request::insert(
            "users",
            vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})],
        ))
        .await;
    assert_eq!(response.count, Some(3));
    let ids = response.data.unwrap();
    assert_eq!(ids.as_array().unwrap().len(), 3);

    let response = client.request(&Request::find("users", json!({}))).await;
    assert_eq!(response.count, Some(3));
}
