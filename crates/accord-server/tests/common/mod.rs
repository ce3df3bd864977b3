//! Shared helpers for the integration tests: an in-process admin API bound
//! to an OS-assigned port.

#![allow(dead_code)]

use accord_server::admin_api::{serve, AdminState};
use accord_server::config::Config;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const NUM_CONTRACT: &str = r#"
'use strict';
module.exports = {
    id: 'num',
    name: 'Lucky number',
    request: {
        method: 'GET',
        urlPath: '/num',
    },
    response: {
        status: 200,
        headers: { 'Content-Type': 'application/json' },
        body: { num: value({ stub: 56789, test: integer({ gt: 0, lt: 60000 }) }) },
    },
};
"#;

pub struct TestAdmin {
    pub url: String,
    pub state: Arc<AdminState>,
    pub client: Client,
}

impl TestAdmin {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(configure: impl FnOnce(&mut Config)) -> Self {
        let mut config = Config::default();
        config.wirestub.host = "127.0.0.1".to_string();
        config.wirestub.shutdown_timeout_ms = 500;
        config.wiretest.timeout_secs = 5;
        configure(&mut config);

        let state = Arc::new(AdminState::from_config(&config).unwrap());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, Arc::clone(&state)));

        Self {
            url: format!("http://{addr}"),
            state,
            client: Client::new(),
        }
    }

    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.url, path)
    }

    pub async fn upload_contract(&self, script: &str) -> reqwest::Response {
        self.client
            .post(self.api("/contracts"))
            .header("Content-Type", "application/vnd.js.contract")
            .body(script.to_string())
            .send()
            .await
            .unwrap()
    }

    pub async fn create_app(&self, app: Value) -> reqwest::Response {
        self.client
            .post(self.api("/apps"))
            .json(&app)
            .send()
            .await
            .unwrap()
    }

    /// Start a wirestub on an OS-assigned port and return that port.
    pub async fn start_wirestub(&self, app_id: &str) -> u16 {
        let resp = self
            .client
            .post(self.api(&format!("/apps/{app_id}/wirestub")))
            .json(&serde_json::json!({"port": 0, "host": "127.0.0.1"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let record: Value = resp.json().await.unwrap();
        record["port"].as_u64().unwrap() as u16
    }
}
