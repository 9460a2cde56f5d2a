use serde::{Deserialize, Serialize};

/// Body of `POST /v1/ai/rect-text/generate`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RectTextRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RectTextResponse {
    pub text: String,
}

/// Body of `POST /v1/ai/text/generate`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextRequest {
    pub prompt: String,
    /// Text already on the canvas; switches the model into edit mode when
    /// it has any non-whitespace content.
    #[serde(rename = "currentText", default)]
    pub current_text: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TextResponse {
    pub text: String,
}
