use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use service_core::error::AppError;

use crate::dtos::{ConsistencyRequest, ConsistencyResponse};
use crate::services::chat_client::NOT_JSON;
use crate::services::prompts::{consistency_user_message, CONSISTENCY_SYSTEM};
use crate::services::{ChatError, ChatMessage};
use crate::startup::AppState;

/// Ask the model whether two canvas fragments describe the same entity and,
/// if so, whether they contradict each other.
#[tracing::instrument(skip(state, request))]
pub async fn check_consistency(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<ConsistencyRequest>, AppError>,
) -> Result<Json<ConsistencyResponse>, AppError> {
    let messages = vec![
        ChatMessage::system(CONSISTENCY_SYSTEM),
        ChatMessage::user(consistency_user_message(&request.left, &request.right)),
    ];

    let parsed = state
        .chat
        .complete_json("consistency", messages, 0.0)
        .await?;

    let verdict = ConsistencyResponse::from_value(&parsed)
        .ok_or(ChatError::InvalidResponse(NOT_JSON))?;

    tracing::info!(
        same_entity = verdict.same_entity,
        inconsistent = verdict.inconsistent,
        "Consistency verdict"
    );

    Ok(Json(verdict))
}
