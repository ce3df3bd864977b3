//! Wire tests replayed against live HTTP servers.

mod common;

use bytes::Bytes;
use common::{TestAdmin, NUM_CONTRACT};
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Response;
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use std::convert::Infallible;
use tokio::net::TcpListener;

/// A server that answers every request with the same JSON body.
async fn fixed_server(status: u16, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let service = service_fn(move |_req| async move {
                    Ok::<_, Infallible>(
                        Response::builder()
                            .status(status)
                            .header("Content-Type", "application/json")
                            .body(Full::new(Bytes::from(body)))
                            .unwrap(),
                    )
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });
    format!("http://{addr}")
}

async fn setup_shop(admin: &TestAdmin, server: Option<&str>) {
    assert_eq!(admin.upload_contract(NUM_CONTRACT).await.status(), 201);
    let mut app = json!({
        "id": "shop",
        "basePath": "/shop",
        "versions": [{"v": "1", "contracts": ["num"]}]
    });
    if let Some(server) = server {
        app["servers"] = json!([server]);
    }
    assert_eq!(admin.create_app(app).await.status(), 201);
}

#[tokio::test]
async fn test_wiretest_against_own_wirestub_passes() {
    let admin = TestAdmin::start().await;
    setup_shop(&admin, None).await;
    let port = admin.start_wirestub("shop").await;

    let record: Value = admin
        .client
        .post(admin.api("/apps/shop/wiretest"))
        .json(&json!({"server": format!("http://127.0.0.1:{port}")}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(record["app"]["id"], "shop");
    assert_eq!(record["testInfo"]["success"], true, "{record:#}");
    let version = &record["results"][0];
    assert_eq!(version["versionNo"], "1");
    let contract = &version["results"][0];
    assert_eq!(contract["testInfo"]["contract"]["id"], "num");
    assert!(contract["testInfo"]["expectedResponseScript"]
        .as_str()
        .unwrap()
        .contains("integer("));
    let request = &contract["requestResults"][0];
    assert_eq!(request["testInfo"]["requestMethod"], "GET");
    assert_eq!(
        request["request"]["urlPath"],
        format!("http://127.0.0.1:{port}/shop/num")
    );
    assert_eq!(request["response"]["status"], 200);

    admin.state.wirestubs.shutdown_all().await;
}

#[tokio::test]
async fn test_wiretest_records_mismatch_from_declared_server() {
    let server = fixed_server(200, r#"{"num": 70000}"#).await;
    let admin = TestAdmin::start().await;
    setup_shop(&admin, Some(&server)).await;

    let record: Value = admin
        .client
        .post(admin.api("/apps/shop/versions/1/contracts/num/wiretest"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(record["testInfo"]["success"], false);
    let request = &record["requestResults"][0];
    assert_eq!(request["testInfo"]["success"], false);
    let errors = request["testInfo"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].as_str().unwrap().contains("body"));
    assert_eq!(request["response"]["body"], r#"{"num": 70000}"#);
}

#[tokio::test]
async fn test_wiretest_records_transport_failure() {
    // Bind and drop to get a port nobody listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let admin = TestAdmin::start().await;
    setup_shop(&admin, None).await;

    let resp = admin
        .client
        .post(admin.api("/apps/shop/versions/1/wiretest"))
        .json(&json!({"server": format!("http://127.0.0.1:{port}")}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let record: Value = resp.json().await.unwrap();
    assert_eq!(record["testInfo"]["success"], false);
    let request = &record["results"][0]["requestResults"][0];
    assert!(request.get("response").is_none());
    assert_eq!(request["testInfo"]["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_wiretest_without_server_is_rejected() {
    let admin = TestAdmin::start().await;
    setup_shop(&admin, None).await;

    let resp = admin
        .client
        .post(admin.api("/apps/shop/wiretest"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = admin
        .client
        .post(admin.api("/apps/ghost/wiretest"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
