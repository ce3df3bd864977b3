//! End-to-end tests for the admin API and wirestub listeners.

mod common;

use assert_json_diff::assert_json_include;
use common::{TestAdmin, NUM_CONTRACT};
use serde_json::{json, Value};

async fn setup_shop(admin: &TestAdmin) {
    let resp = admin.upload_contract(NUM_CONTRACT).await;
    assert_eq!(resp.status(), 201);
    assert_eq!(
        resp.headers().get("location").unwrap(),
        "/api/v1/contracts/num"
    );

    let resp = admin
        .create_app(json!({
            "id": "shop",
            "basePath": "/shop",
            "versions": [{"v": "1", "contracts": ["num"]}]
        }))
        .await;
    assert_eq!(resp.status(), 201);
}

#[tokio::test]
async fn test_liveness_and_health() {
    let admin = TestAdmin::start().await;

    let resp = admin.client.get(format!("{}/api", admin.url)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");

    let health: Value = admin
        .client
        .get(format!("{}/health", admin.url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["wirestubs"], 0);
}

#[tokio::test]
async fn test_wirestub_serves_stub_side_of_contract() {
    let admin = TestAdmin::start().await;
    setup_shop(&admin).await;
    let port = admin.start_wirestub("shop").await;

    let resp = admin
        .client
        .get(format!("http://127.0.0.1:{port}/shop/num"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("content-type").unwrap(), "application/json");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["num"], 56789);

    let resp = admin
        .client
        .get(format!("http://127.0.0.1:{port}/shop/missing"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.text().await.unwrap(), "Not found");

    let resp = admin
        .client
        .post(format!("http://127.0.0.1:{port}/shop/num"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    admin.state.wirestubs.shutdown_all().await;
}

#[tokio::test]
async fn test_oversized_body_is_rejected_and_counted_as_error() {
    let admin = TestAdmin::start_with(|config| config.wirestub.max_body_bytes = 16).await;
    setup_shop(&admin).await;
    let port = admin.start_wirestub("shop").await;

    let resp = admin
        .client
        .post(format!("http://127.0.0.1:{port}/shop/num"))
        .body("x".repeat(64))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);

    let metrics = admin
        .client
        .get(format!("{}/metrics", admin.url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains(r#"accord_stub_requests_total{outcome="error"}"#), "{metrics}");
    assert!(!metrics.contains("too_large"), "{metrics}");

    admin.state.wirestubs.shutdown_all().await;
}

#[tokio::test]
async fn test_wirestub_lifecycle_over_admin_api() {
    let admin = TestAdmin::start().await;
    setup_shop(&admin).await;
    let wirestub_url = admin.api("/apps/shop/wirestub");

    let resp = admin.client.get(&wirestub_url).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let port = admin.start_wirestub("shop").await;

    // Creating again leaves the running listener untouched
    let resp = admin
        .client
        .post(&wirestub_url)
        .json(&json!({"port": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let record: Value = admin
        .client
        .get(&wirestub_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(record["port"], port);

    let resp = admin.client.delete(&wirestub_url).send().await.unwrap();
    assert_eq!(resp.status(), 204);
    let resp = admin.client.delete(&wirestub_url).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"][0]["message"], "Wirestub not found");

    // The port is free again once delete returns
    let resp = admin
        .client
        .post(&wirestub_url)
        .json(&json!({"port": port, "host": "127.0.0.1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    admin.state.wirestubs.shutdown_all().await;
}

#[tokio::test]
async fn test_wirestub_for_unknown_app_is_not_found() {
    let admin = TestAdmin::start().await;
    let resp = admin
        .client
        .post(admin.api("/apps/ghost/wirestub"))
        .json(&json!({"port": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_version_crud() {
    let admin = TestAdmin::start().await;
    setup_shop(&admin).await;
    let versions_url = admin.api("/apps/shop/versions");

    let resp = admin
        .client
        .post(&versions_url)
        .json(&json!({"v": "2", "path": "{{app.basePath}}/v2", "contracts": ["num"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = admin
        .client
        .post(&versions_url)
        .json(&json!({"v": "2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let resp = admin
        .client
        .post(&versions_url)
        .json(&json!({"contracts": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let numbers: Vec<String> = admin
        .client
        .get(&versions_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(numbers, vec!["1", "2"]);

    let resp = admin
        .client
        .put(admin.api("/apps/shop/versions/3"))
        .json(&json!({"contracts": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = admin
        .client
        .delete(admin.api("/apps/shop/versions/2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
    let resp = admin
        .client
        .delete(admin.api("/apps/shop/versions/2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_contract_views() {
    let admin = TestAdmin::start().await;
    assert_eq!(admin.upload_contract(NUM_CONTRACT).await.status(), 201);
    assert_eq!(admin.upload_contract(NUM_CONTRACT).await.status(), 409);

    let raw = admin
        .client
        .get(admin.api("/contracts/num"))
        .send()
        .await
        .unwrap();
    assert_eq!(
        raw.headers().get("content-type").unwrap(),
        "application/vnd.js.contract"
    );
    assert_eq!(raw.text().await.unwrap(), NUM_CONTRACT);

    let stub = admin
        .client
        .get(admin.api("/contracts/num?view=stub"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(stub.contains("56789"), "{stub}");
    assert!(!stub.contains("integer("), "{stub}");

    let test = admin
        .client
        .get(admin.api("/contracts/num?view=test"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(test.contains("integer("), "{test}");
    assert!(!test.contains("56789"), "{test}");

    let summary: Value = admin
        .client
        .get(admin.api("/contracts/num"))
        .header("Accept", "application/json")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["name"], "Lucky number");

    let resp = admin.upload_contract("module.exports = [1, 2];").await;
    assert_eq!(resp.status(), 400);
    let resp = admin.upload_contract("require('fs')").await;
    assert_eq!(resp.status(), 400);

    let resp = admin
        .client
        .delete(admin.api("/contracts/num"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
    let resp = admin
        .client
        .get(admin.api("/contracts/num"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_app_crud() {
    let admin = TestAdmin::start().await;
    setup_shop(&admin).await;

    let resp = admin.create_app(json!({"id": "shop", "basePath": "/other"})).await;
    assert_eq!(resp.status(), 409);

    let resp = admin
        .create_app(json!({"id": "dup", "versions": [{"v": "1"}, {"v": "1"}]}))
        .await;
    assert_eq!(resp.status(), 409);
    let resp = admin
        .client
        .put(admin.api("/apps/shop"))
        .json(&json!({"basePath": "/shop", "versions": [{"v": "1"}, {"v": "1"}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let resp = admin.create_app(json!({"basePath": "/anon"})).await;
    assert_eq!(resp.status(), 201);
    let generated: Value = resp.json().await.unwrap();
    let generated_id = generated["id"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&generated_id).is_ok());

    let ids: Vec<String> = admin
        .client
        .get(admin.api("/apps"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ids, vec!["shop".to_string(), generated_id]);

    let resp = admin
        .client
        .put(admin.api("/apps/shop"))
        .json(&json!({"basePath": "/store", "servers": ["http://prod.test"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let app: Value = admin
        .client
        .get(admin.api("/apps/shop"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_json_include!(
        actual: app,
        expected: json!({"id": "shop", "name": "shop", "basePath": "/store", "servers": ["http://prod.test"]})
    );

    let resp = admin.client.delete(admin.api("/apps/shop")).send().await.unwrap();
    assert_eq!(resp.status(), 204);
    let resp = admin.client.get(admin.api("/apps/shop")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"][0]["code"], "404");
}
