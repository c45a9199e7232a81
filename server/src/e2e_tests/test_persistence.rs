//! Round-trip persistence: a restarted server answers queries with the
//! same result sets.

use std::collections::HashSet;

use serde_json::{Value, json};

use crate::testing::{TestClient, start_test_server, start_test_server_in};
use crate::wire::Request;

fn id_set(docs: &Value) -> HashSet<String> {
    docs.as_array()
        .unwrap()
        .iter()
        .map(|d| d["_id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn restart_preserves_query_results() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert(
            "inventory",
            vec![
                json!({"sku": "a-1", "qty": 5}),
                json!({"sku": "a-2", "qty": 12}),
                json!({"sku": "b-1", "qty": 3}),
            ],
        ))
        .await;
    client
        .request(&Request::create_index("inventory", "qty"))
        .await;
    client
        .request(&Request::create_index("inventory", "sku"))
        .await;
    client
        .request(&Request::delete("inventory", json!({"sku": "b-1"})))
        .await;

    let queries = [
        json!({}),
        json!({"qty": {"$gt": 4}}),
        json!({"sku": "a-1"}),
        json!({"sku": {"$in": ["a-1", "a-2"]}}),
    ];

    let mut before = Vec::new();
    for query in &queries {
        let response = client
            .request(&Request::find("inventory", query.clone()))
            .await;
        before.push(id_set(&response.data.unwrap()));
    }

    // Restart over the same directory.
    let dir = ts.dir;
    let ts = start_test_server_in(dir).await;
    let mut client = TestClient::connect(ts.addr).await;

    for (query, expected) in queries.iter().zip(&before) {
        let response = client
            .request(&Request::find("inventory", query.clone()))
            .await;
        assert_eq!(&id_set(&response.data.unwrap()), expected, "query {query}");
    }
}

#[tokio::test]
async fn on_disk_layout_matches_the_documented_format() {
    let ts = start_test_server().await;
    let mut client = TestClient::connect(ts.addr).await;

    client
        .request(&Request::insert("layout", vec![json!({"v": 7})]))
        .await;
    client
        .request(&Request::create_index("layout", "v"))
        .await;
    client
        .request(&Request::insert("layout", vec![json!({"tag": "t"})]))
        .await;
    client
        .request(&Request::create_index("layout", "tag"))
        .await;

    let base = ts.dir.path();
    let store: Value =
        serde_json::from_str(&std::fs::read_to_string(base.join("layout.json")).unwrap()).unwrap();
    let store_obj = store.as_object().unwrap();
    assert_eq!(store_obj.len(), 2);
    for (id, doc) in store_obj {
        assert_eq!(doc["_id"], json!(id.as_str()));
    }

    let btree: Value = serde_json::from_str(
        &std::fs::read_to_string(base.join("indexes/layout.v.btree.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(btree["leaf"], json!(true));
    assert_eq!(btree["keys"], json!([7.0]));

    let hash: Value = serde_json::from_str(
        &std::fs::read_to_string(base.join("indexes/layout.tag.index.json")).unwrap(),
    )
    .unwrap();
    assert!(hash.get("s:t").is_some());
}
