//! Client for an OpenAI-compatible `POST {base}/chat/completions` endpoint.
//!
//! One attempt per call, no retries. Failures are classified into
//! [`ChatError`] so handlers can map them onto HTTP statuses.

use crate::config::UpstreamConfig;
use crate::services::metrics;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::error::AppError;
use service_core::observability::TracedClientExt;
use std::time::Instant;
use thiserror::Error;

pub const INVALID_RESPONSE: &str = "Invalid response from model";
pub const NOT_JSON: &str = "Model did not return JSON";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("OPEN_API_KEY not configured")]
    NotConfigured,

    /// Transport failure before a complete response arrived (DNS, connect,
    /// timeout).
    #[error("Upstream error: {0}")]
    Unavailable(String),

    /// The API answered with anything but `200 OK`. `detail` is the parsed
    /// JSON body when possible, the raw text otherwise.
    #[error("Upstream returned {status}")]
    Upstream { status: StatusCode, detail: Value },

    #[error("{0}")]
    InvalidResponse(&'static str),
}

impl ChatError {
    fn outcome(&self) -> &'static str {
        match self {
            ChatError::NotConfigured => "not_configured",
            ChatError::Unavailable(_) => "unavailable",
            ChatError::Upstream { .. } => "upstream_error",
            ChatError::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotConfigured => AppError::ConfigError(anyhow::anyhow!(err.to_string())),
            ChatError::Unavailable(_) => AppError::BadGateway(err.to_string()),
            ChatError::Upstream { status, detail } => AppError::Upstream { status, detail },
            ChatError::InvalidResponse(msg) => AppError::InvalidUpstreamResponse(msg.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Provider hint that the completion itself must be a JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".to_string(),
        }
    }
}

/// Request body sent upstream.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    // Only the first element is interpreted; later ones may be any shape.
    choices: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a completion body.
///
/// Every malformed shape yields `None`: a non-JSON or non-object body,
/// missing or empty `choices`, a choice without `message`, or a missing,
/// non-string or empty `content`.
pub fn extract_content(body: &[u8]) -> Option<String> {
    let completion: ChatCompletion = serde_json::from_slice(body).ok()?;
    let first = completion.choices.into_iter().next()?;
    let choice: Choice = serde_json::from_value(first).ok()?;
    choice.message?.content.filter(|content| !content.is_empty())
}

/// Error detail for a non-success reply: JSON if it parses, raw text otherwise.
fn error_detail(body: &[u8]) -> Value {
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    config: UpstreamConfig,
}

impl ChatClient {
    /// Build a client whose every call is bounded by `config.timeout`.
    pub fn new(config: UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Run a completion and return its text trimmed of surrounding whitespace.
    pub async fn complete_text(
        &self,
        operation: &'static str,
        messages: Vec<ChatMessage>,
        temperature: f32,
    ) -> Result<String, ChatError> {
        let content = self.complete(operation, messages, temperature, None).await?;
        let text = content.trim();

        if text.is_empty() {
            return Err(ChatError::InvalidResponse(INVALID_RESPONSE));
        }

        Ok(text.to_string())
    }

    /// Run a completion in JSON mode and parse its content as JSON.
    pub async fn complete_json(
        &self,
        operation: &'static str,
        messages: Vec<ChatMessage>,
        temperature: f32,
    ) -> Result<Value, ChatError> {
        let content = self
            .complete(
                operation,
                messages,
                temperature,
                Some(ResponseFormat::json_object()),
            )
            .await?;

        serde_json::from_str(&content).map_err(|e| {
            tracing::warn!(operation, error = %e, "Model content is not valid JSON");
            ChatError::InvalidResponse(NOT_JSON)
        })
    }

    #[tracing::instrument(skip(self, messages, response_format), fields(model = %self.config.model))]
    pub async fn complete(
        &self,
        operation: &'static str,
        messages: Vec<ChatMessage>,
        temperature: f32,
        response_format: Option<ResponseFormat>,
    ) -> Result<String, ChatError> {
        let start = Instant::now();
        let result = self.send(messages, temperature, response_format).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.outcome(),
        };
        metrics::record_upstream_request(operation, outcome);

        match &result {
            Ok(_) => {
                let elapsed = start.elapsed().as_secs_f64();
                metrics::record_upstream_latency(operation, &self.config.model, elapsed);
                tracing::info!(elapsed_secs = elapsed, "Chat completion succeeded");
            }
            Err(ChatError::Upstream { status, .. }) => {
                tracing::warn!(status = %status, "Chat completion rejected by upstream");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat completion failed");
            }
        }

        result
    }

    async fn send(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        response_format: Option<ResponseFormat>,
    ) -> Result<String, ChatError> {
        let api_key = match &self.config.api_key {
            Some(key) if !key.expose_secret().is_empty() => key,
            _ => return Err(ChatError::NotConfigured),
        };

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature,
            response_format,
        };

        let url = self.config.completions_url();

        tracing::debug!(
            url = %url,
            message_count = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .traced_post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ChatError::Unavailable(e.to_string()))?;

        if status != StatusCode::OK {
            return Err(ChatError::Upstream {
                status,
                detail: error_detail(&body),
            });
        }

        extract_content(&body).ok_or(ChatError::InvalidResponse(INVALID_RESPONSE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn extracts_first_choice_content() {
        let body = body(json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "  Hello world  "}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        }));

        assert_eq!(extract_content(&body).as_deref(), Some("  Hello world  "));
    }

    #[test]
    fn malformed_bodies_have_no_content() {
        let cases = [
            b"not json at all".to_vec(),
            body(json!(["choices"])),
            body(json!({})),
            body(json!({"choices": null})),
            body(json!({"choices": "nope"})),
            body(json!({"choices": []})),
            body(json!({"choices": [{}]})),
            body(json!({"choices": [{"message": null}]})),
            body(json!({"choices": [{"message": {"role": "assistant"}}]})),
            body(json!({"choices": [{"message": {"content": null}}]})),
            body(json!({"choices": [{"message": {"content": 7}}]})),
            body(json!({"choices": [{"message": {"content": ""}}]})),
        ];

        for case in cases {
            assert_eq!(
                extract_content(&case),
                None,
                "{}",
                String::from_utf8_lossy(&case)
            );
        }
    }

    #[test]
    fn later_choices_do_not_affect_extraction() {
        let cases = [
            br#"{"choices":[{"message":{"content":"hi"}},5]}"#.to_vec(),
            br#"{"choices":[{"message":{"content":"hi"}},{"message":"x"}]}"#.to_vec(),
            br#"{"choices":[{"message":{"content":"hi"}},{"message":{"content":7}}]}"#.to_vec(),
        ];

        for case in cases {
            assert_eq!(
                extract_content(&case).as_deref(),
                Some("hi"),
                "{}",
                String::from_utf8_lossy(&case)
            );
        }
    }

    #[test]
    fn error_detail_prefers_json() {
        assert_eq!(error_detail(br#"{"error": "boom"}"#), json!({"error": "boom"}));
        assert_eq!(
            error_detail(b"Bad Gateway"),
            Value::String("Bad Gateway".to_string())
        );
    }

    #[test]
    fn request_omits_absent_response_format() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u")],
            temperature: 0.2,
            response_format: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("response_format").is_none());
        assert_eq!(value["messages"][0], json!({"role": "system", "content": "s"}));
        assert_eq!(value["messages"][1], json!({"role": "user", "content": "u"}));
    }

    #[test]
    fn json_mode_serializes_type_field() {
        let value = serde_json::to_value(ResponseFormat::json_object()).unwrap();
        assert_eq!(value, json!({"type": "json_object"}));
    }

    #[test]
    fn errors_map_to_http_statuses() {
        assert_eq!(
            AppError::from(ChatError::NotConfigured).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(ChatError::Unavailable("timed out".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(ChatError::Upstream {
                status: StatusCode::UNAUTHORIZED,
                detail: json!({"error": "bad key"}),
            })
            .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(ChatError::InvalidResponse(NOT_JSON)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
