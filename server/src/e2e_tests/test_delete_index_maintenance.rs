//! Deletes keep indexes consistent, in memory and across restart.

use serde_json::json;

use crate::testing::{TestClient, start_test_server, start_test_server_in};
use crate::wire::{Request, Status};

#[tokio::test]
async fn delete_removes_documents_from_the_index() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert(
            "users",
            vec![json!({"name": "A"}), json!({"name": "B"})],
        ))
        .await;
    client
        .request(&Request::create_index("users", "name"))
        .await;

    let response = client
        .request(&Request::delete("users", json!({"name": "A"})))
        .await;
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.count, Some(1));

    let response = client
        .request(&Request::find("users", json!({"name": "A"})))
        .await;
    assert_eq!(response.count, Some(0));

    let response = client
        .request(&Request::find("users", json!({"name": "B"})))
        .await;
    assert_eq!(response.count, Some(1));
}

#[tokio::test]
async fn deleted_documents_stay_gone_after_restart() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert(
            "users",
            vec![json!({"name": "A"}), json!({"name": "B"})],
        ))
        .await;
    client
        .request(&Request::create_index("users", "name"))
        .await;
    client
        .request(&Request::delete("users", json!({"name": "A"})))
        .await;

    // Restart the server over the same database directory.
    let dir = ts.dir;
    drop(ts.server);
    let ts = start_test_server_in(dir).await;
    let mut client = TestClient::connect(ts.addr).await;

    let response = client
        .request(&Request::find("users", json!({"name": "A"})))
        .await;
    assert_eq!(response.count, Some(0));

    let response = client
        .request(&Request::find("users", json!({"name": "B"})))
        .await;
    assert_eq!(response.count, Some(1));
}

#[tokio::test]
async fn delete_on_empty_result_reports_zero() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert("users", vec![json!({"name": "A"})]))
        .await;

    let response = client
        .request(&Request::delete("users", json!({"name": "missing"})))
        .await;
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.count, Some(0));
}
