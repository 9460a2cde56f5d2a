//! Application startup and lifecycle management.

use crate::config::{CorsConfig, RelayConfig};
use crate::handlers::{
    consistency::check_consistency,
    health::health_check,
    metrics::metrics,
    text::{generate_rect_text, generate_text},
};
use crate::middleware::metrics_middleware;
use crate::services::ChatClient;
use axum::{
    body::Body,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{make_request_span, request_id_middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub chat: Arc<ChatClient>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self, AppError> {
        let chat = ChatClient::new(config.upstream.clone()).map_err(|e| {
            tracing::error!("Failed to build upstream HTTP client: {}", e);
            AppError::InternalError(anyhow::Error::new(e))
        })?;

        Ok(Self {
            config: Arc::new(config),
            chat: Arc::new(chat),
        })
    }
}

/// CORS policy for the browser client.
///
/// Methods and headers are mirrored from the preflight, which allows
/// everything while staying valid alongside credentials. A `*` entry in the
/// origin list mirrors the caller's origin.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allow_origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}': {}", o, e);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/v1/ai/rect-text/generate", post(generate_rect_text))
        .route("/v1/ai/text/generate", post(generate_text))
        .route("/v1/ai/consistency/check", post(check_consistency))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(from_fn(request_id_middleware))
        .layer(cors)
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        if !config.upstream.has_api_key() {
            tracing::warn!("OPEN_API_KEY is not set; generation endpoints will fail until it is");
        }

        tracing::info!(
            api_base = %config.upstream.api_base,
            model = %config.upstream.model,
            timeout_secs = config.upstream.timeout.as_secs(),
            allowed_origins = ?config.cors.allowed_origins,
            "Initialized chat-completion relay"
        );

        let address = config.common.address();
        let state = AppState::new(config)?;

        // port 0 = random port for testing
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Relay service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
