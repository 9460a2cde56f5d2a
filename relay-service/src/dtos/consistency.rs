use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /v1/ai/consistency/check`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsistencyRequest {
    pub left: String,
    pub right: String,
}

/// Verdict returned to the client, parsed out of the model's JSON reply.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct ConsistencyResponse {
    pub same_entity: bool,
    pub inconsistent: bool,
    pub reason: String,
}

impl ConsistencyResponse {
    /// Read a verdict from a parsed JSON object, defaulting missing fields
    /// and coercing loosely typed ones. Returns `None` for non-objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        Some(Self {
            same_entity: object.get("same_entity").is_some_and(truthy),
            inconsistent: object.get("inconsistent").is_some_and(truthy),
            reason: object.get("reason").map(as_reason).unwrap_or_default(),
        })
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn as_reason(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
