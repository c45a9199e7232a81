//! A mixed-type field builds a B-tree that ignores non-numeric values;
//! non-numeric predicates fall back to the primary scan.

use serde_json::json;

use crate::testing::{TestClient, start_test_server};
use crate::wire::Request;

#[tokio::test]
async fn non_numeric_value_is_found_via_scan() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert(
            "mixed",
            vec![json!({"x": 1}), json!({"x": "one"})],
        ))
        .await;

    // At least one numeric value, so this builds a B-tree.
    let response = client
        .request(&Request::create_index("mixed", "x"))
        .await;
    assert!(response.message.contains("B-tree"));

    let response = client
        .request(&Request::find("mixed", json!({"x": "one"})))
        .await;
    assert_eq!(response.count, Some(1));
    assert_eq!(response.data.unwrap()[0]["x"], json!("one"));

    let response = client
        .request(&Request::find("mixed", json!({"x": {"$eq": 1}})))
        .await;
    assert_eq!(response.count, Some(1));
}

#[tokio::test]
async fn string_one_and_number_one_do_not_collide() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert(
            "mixed",
            vec![json!({"x": 1}), json!({"x": "1"})],
        ))
        .await;

    let number = client
        .request(&Request::find("mixed", json!({"x": 1})))
        .await;
    assert_eq!(number.count, Some(1));
    assert_eq!(number.data.unwrap()[0]["x"], json!(1));

    let string = client
        .request(&Request::find("mixed", json!({"x": "1"})))
        .await;
    assert_eq!(string.count, Some(1));
    assert_eq!(string.data.unwrap()[0]["x"], json!("1"));
}
