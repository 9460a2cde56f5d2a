use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use service_core::error::AppError;

use crate::dtos::{RectTextRequest, RectTextResponse, TextRequest, TextResponse};
use crate::handlers::TEXT_TEMPERATURE;
use crate::services::prompts::{TextPrompt, RECT_TEXT_SYSTEM};
use crate::services::ChatMessage;
use crate::startup::AppState;

/// Generate short text for a diagram rectangle.
#[tracing::instrument(skip(state, request), fields(prompt_len = request.prompt.len()))]
pub async fn generate_rect_text(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<RectTextRequest>, AppError>,
) -> Result<Json<RectTextResponse>, AppError> {
    let messages = vec![
        ChatMessage::system(RECT_TEXT_SYSTEM),
        ChatMessage::user(request.prompt),
    ];

    let text = state
        .chat
        .complete_text("rect_text", messages, TEXT_TEMPERATURE)
        .await?;

    Ok(Json(RectTextResponse { text }))
}

/// Generate new text, or rewrite `currentText` when the client sends some.
#[tracing::instrument(skip(state, request), fields(prompt_len = request.prompt.len()))]
pub async fn generate_text(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<TextRequest>, AppError>,
) -> Result<Json<TextResponse>, AppError> {
    let prompt = TextPrompt::for_current_text(&request.current_text);
    tracing::debug!(edit = matches!(prompt, TextPrompt::Edit { .. }), "Selected text prompt");

    let messages = vec![
        ChatMessage::system(prompt.system_message()),
        ChatMessage::user(request.prompt),
    ];

    let text = state
        .chat
        .complete_text("text", messages, TEXT_TEMPERATURE)
        .await?;

    Ok(Json(TextResponse { text }))
}
