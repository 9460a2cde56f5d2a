use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {1}")]
    InvalidRequest(StatusCode, String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    /// Non-success reply from a dependency, forwarded with its own status.
    #[error("Upstream returned {status}")]
    Upstream { status: StatusCode, detail: Value },

    #[error("Invalid upstream response: {0}")]
    InvalidUpstreamResponse(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.status(), rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(status, _) => *status,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Upstream { status, .. } => *status,
            AppError::ConfigError(_)
            | AppError::InvalidUpstreamResponse(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            detail: Value,
        }

        let status = self.status();
        let detail = match self {
            AppError::InvalidRequest(_, msg) => Value::String(msg),
            AppError::ConfigError(err) => Value::String(err.to_string()),
            AppError::BadGateway(msg) => Value::String(msg),
            AppError::Upstream { detail, .. } => detail,
            AppError::InvalidUpstreamResponse(msg) => Value::String(msg),
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Unhandled internal error");
                Value::String("Internal server error".to_string())
            }
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}
