#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use relay_service::config::{CorsConfig, ObservabilityConfig, RelayConfig, UpstreamConfig};
use relay_service::startup::{build_router, AppState};
use serde_json::{json, Value};
use service_core::config::Config;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::MockServer;

pub const TEST_API_KEY: &str = "sk-test-key";
pub const TEST_MODEL: &str = "gpt-4o-mini";
pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

pub struct TestApp {
    pub router: Router,
    pub upstream: MockServer,
}

pub fn relay_config(api_key: Option<&str>, api_base: &str, timeout: Duration) -> RelayConfig {
    RelayConfig {
        common: Config {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        upstream: UpstreamConfig::new(api_key, api_base, TEST_MODEL, timeout),
        cors: CorsConfig::default(),
        observability: ObservabilityConfig {
            log_level: "debug".to_string(),
            otlp_endpoint: None,
        },
    }
}

pub fn router_for(config: RelayConfig) -> Router {
    let state = AppState::new(config).expect("Failed to build app state");
    build_router(state)
}

impl TestApp {
    /// Relay wired to a fresh stub upstream, with a valid key.
    pub async fn spawn() -> Self {
        Self::spawn_with(Some(TEST_API_KEY), Duration::from_secs(5)).await
    }

    pub async fn spawn_with(api_key: Option<&str>, timeout: Duration) -> Self {
        let upstream = MockServer::start().await;
        let api_base = format!("{}/v1", upstream.uri());
        let router = router_for(relay_config(api_key, &api_base, timeout));

        Self { router, upstream }
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        send_json(&self.router, Method::POST, uri, Some(body)).await
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        send_json(&self.router, Method::GET, uri, None).await
    }

    /// Bodies of every request the stub upstream received, as JSON.
    pub async fn upstream_bodies(&self) -> Vec<Value> {
        self.upstream
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).expect("Upstream body is not JSON"))
            .collect()
    }
}

pub async fn send_json(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    (status, value)
}

/// A minimal OpenAI-style completion body.
pub fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": TEST_MODEL,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}
