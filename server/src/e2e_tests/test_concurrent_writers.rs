//! Concurrent writers on one collection serialise under the gate.

use std::collections::HashSet;

use serde_json::json;

use crate::testing::{TestClient, start_test_server};
use crate::wire::{Request, Status};

const INSERTS_PER_CLIENT: usize = 100;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_clients_inserting_concurrently_lose_nothing() {
    let ts = start_test_server().await;

    let mut tasks = Vec::new();
    for writer in 0..2 {
        let addr = ts.addr;
        tasks.push(tokio::spawn(async move {
            let mut client = TestClient::connect(addr).await;
            let mut ids = Vec::new();
            for i in 0..INSERTS_PER_CLIENT {
                let response = client
                    .request(&Request::insert(
                        "shared",
                        vec![json!({"writer": writer, "seq": i})],
                    ))
                    .await;
                assert_eq!(response.status, Status::Success, "{}", response.message);
                let id = response.data.unwrap()[0].as_str().unwrap().to_string();
                ids.push(id);
            }
            ids
        }));
    }

    let mut all_ids = Vec::new();
    for task in tasks {
        all_ids.extend(task.await.expect("writer task"));
    }
    assert_eq!(all_ids.len(), 2 * INSERTS_PER_CLIENT);

    let unique: HashSet<&String> = all_ids.iter().collect();
    assert_eq!(unique.len(), 2 * INSERTS_PER_CLIENT, "ids are unique");

    let mut client = TestClient::connect(ts.addr).await;
    let response = client.request(&Request::find("shared", json!({}))).await;
    assert_eq!(response.count, Some(2 * INSERTS_PER_CLIENT));

    // Every returned document carries one of the reported ids.
    let docs = response.data.unwrap();
    let returned: HashSet<String> = docs
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(returned.len(), 2 * INSERTS_PER_CLIENT);
    for id in &all_ids {
        assert!(returned.contains(id));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_run_while_writers_mutate() {
    let ts = start_test_server().await;

    let addr = ts.addr;
    let writer = tokio::spawn(async move {
        let mut client = TestClient::connect(addr).await;
        for i in 0..50 {
            let response = client
                .request(&Request::insert("feed", vec![json!({"seq": i})]))
                .await;
            assert_eq!(response.status, Status::Success);
        }
    });

    let reader = tokio::spawn(async move {
        let mut client = TestClient::connect(addr).await;
        let mut last = 0;
        for _ in 0..50 {
            let response = client.request(&Request::find("feed", json!({}))).await;
            assert_eq!(response.status, Status::Success);
            let count = response.count.unwrap();
            // Under the gate a reader sees a monotonically growing,
            // fully consistent store.
            assert!(count >= last);
            last = count;
        }
    });

    writer.await.expect("writer");
    reader.await.expect("reader");

    let mut client = TestClient::connect(ts.addr).await;
    let response = client.request(&Request::find("feed", json!({}))).await;
    assert_eq!(response.count, Some(50));
}
