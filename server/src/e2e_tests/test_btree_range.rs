//! Range queries answered by a B-tree index.

use serde_json::json;

use crate::testing::{TestClient, start_test_server};
use crate::wire::{Request, Status};

#[tokio::test]
async fn open_range_returns_interior_values_in_order() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert(
            "events",
            vec![json!({"v": 1}), json!({"v": 2}), json!({"v": 3}), json!({"v": 4})],
        ))
        .await;

    let response = client
        .request(&Request::create_index("events", "v"))
        .await;
    assert_eq!(response.status, Status::Success);
    assert!(response.message.contains("B-tree"));

    let response = client
        .request(&Request::find("events", json!({"v": {"$gt": 1, "$lt": 4}})))
        .await;
    assert_eq!(response.count, Some(2));
    let docs = response.data.unwrap();
    let values: Vec<i64> = docs
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["v"].as_i64().unwrap())
        .collect();
    assert_eq!(values, vec![2, 3], "ascending order of v");
}

#[tokio::test]
async fn one_sided_ranges_and_point_lookups() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert(
            "events",
            vec![json!({"v": 10}), json!({"v": 20}), json!({"v": 30})],
        ))
        .await;
    client
        .request(&Request::create_index("events", "v"))
        .await;

    let gt = client
        .request(&Request::find("events", json!({"v": {"$gt": 10}})))
        .await;
    assert_eq!(gt.count, Some(2));

    let lt = client
        .request(&Request::find("events", json!({"v": {"$lt": 30}})))
        .await;
    assert_eq!(lt.count, Some(2));

    let eq = client
        .request(&Request::find("events", json!({"v": {"$eq": 20}})))
        .await;
    assert_eq!(eq.count, Some(1));

    // Committed planner: an empty index answer is authoritative.
    let none = client
        .request(&Request::find("events", json!({"v": {"$eq": 99}})))
        .await;
    assert_eq!(none.count, Some(0));
}

#[tokio::test]
async fn index_tracks_inserts_made_after_creation() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert("events", vec![json!({"v": 1})]))
        .await;
    client
        .request(&Request::create_index("events", "v"))
        .await;
    client
        .request(&Request::insert("events", vec![json!({"v": 2}), json!({"v": 3})]))
        .await;

    let response = client
        .request(&Request::find("events", json!({"v": {"$gt": 1}})))
        .await;
    assert_eq!(response.count, Some(2));
}
