use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_ALLOWED_ORIGINS: &str =
    "http://localhost:5173,http://127.0.0.1:5173,http://localhost:3000,http://127.0.0.1:3000";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Process-wide settings, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub common: core_config::Config,
    pub upstream: UpstreamConfig,
    pub cors: CorsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Bearer credential for the chat-completion API. Absence is reported
    /// per request, not at startup.
    pub api_key: Option<Secret<String>>,
    /// Base URL without a trailing slash, e.g. `https://api.openai.com/v1`.
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl UpstreamConfig {
    pub fn new(api_key: Option<&str>, api_base: &str, model: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key
                .filter(|k| !k.trim().is_empty())
                .map(|k| Secret::new(k.to_string())),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self::new(
            None,
            DEFAULT_API_BASE,
            DEFAULT_MODEL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: parse_origins(DEFAULT_ALLOWED_ORIGINS),
        }
    }
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Ok(Self::from_lookup(common, |key| env::var(key).ok()))
    }

    /// Build the relay settings from an arbitrary key lookup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPEN_API_KEY");
        let api_base = lookup("OPEN_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let model = lookup("OPEN_API_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout_secs = parse_or_default(
            "OPEN_API_TIMEOUT_SECS",
            lookup("OPEN_API_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        );
        let origins =
            lookup("CORS_ALLOW_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string());

        RelayConfig {
            common,
            upstream: UpstreamConfig::new(
                api_key.as_deref(),
                &api_base,
                &model,
                Duration::from_secs(timeout_secs),
            ),
            cors: CorsConfig {
                allowed_origins: parse_origins(&origins),
            },
            observability: ObservabilityConfig {
                log_level: lookup("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
                otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|e| !e.trim().is_empty()),
            },
        }
    }
}

/// Split a comma-separated origin list, trimming entries and dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or_default(key: &str, value: Option<String>, default: u64) -> u64 {
    match value {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default, "Invalid numeric setting, using default");
            default
        }),
    }
}
