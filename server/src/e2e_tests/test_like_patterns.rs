//! `$like` pattern scenarios.

use serde_json::json;

use crate::testing::{TestClient, start_test_server};
use crate::wire::Request;

#[tokio::test]
async fn like_is_case_insensitive_and_anchored() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert(
            "words",
            vec![json!({"k": "Alpha"}), json!({"k": "beta"})],
        ))
        .await;

    let response = client
        .request(&Request::find("words", json!({"k": {"$like": "a%"}})))
        .await;
    assert_eq!(response.count, Some(1));
    let docs = response.data.unwrap();
    assert_eq!(docs[0]["k"], json!("Alpha"));

    // Anchoring: a bare substring does not match mid-string.
    let response = client
        .request(&Request::find("words", json!({"k": {"$like": "lph"}})))
        .await;
    assert_eq!(response.count, Some(0));

    let response = client
        .request(&Request::find("words", json!({"k": {"$like": "%lph%"}})))
        .await;
    assert_eq!(response.count, Some(1));
}

#[tokio::test]
async fn underscore_matches_a_single_character() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert(
            "words",
            vec![json!({"k": "cat"}), json!({"k": "cart"})],
        ))
        .await;

    let response = client
        .request(&Request::find("words", json!({"k": {"$like": "c_t"}})))
        .await;
    assert_eq!(response.count, Some(1));
    assert_eq!(response.data.unwrap()[0]["k"], json!("cat"));
}

#[tokio::test]
async fn like_ignores_non_string_fields() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert(
            "words",
            vec![json!({"k": 5}), json!({"k": "five"})],
        ))
        .await;

    let response = client
        .request(&Request::find("words", json!({"k": {"$like": "%"}})))
        .await;
    assert_eq!(response.count, Some(1));
    assert_eq!(response.data.unwrap()[0]["k"], json!("five"));
}
