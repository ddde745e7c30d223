use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_MODEL_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL_NAME: &str = "gpt-4o-mini";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 15;
const DEFAULT_CONTEXT_API_URL: &str = "http://127.0.0.1:4141";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:9431";

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Credential for the generative endpoint. `None` when unconfigured;
    /// the provider fails each request with a Config error before any
    /// network call, so the service still boots for health checks.
    pub model_api_key: Option<String>,
    pub model_base_url: String,
    pub model_name: String,
    pub model_timeout: Duration,
    /// Base URL of the persistence layer that owns `/products/{id}/context`.
    pub context_api_url: String,
    pub bind_addr: SocketAddr,
}

/// Read an env var, treating unset and empty as absent.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr = env_opt("BIND_ADDR")
            .and_then(|v| {
                v.parse()
                    .map_err(|e| {
                        tracing::warn!("Invalid BIND_ADDR {:?}: {} — using default", v, e);
                    })
                    .ok()
            })
            .unwrap_or_else(|| {
                DEFAULT_BIND_ADDR
                    .parse()
                    .expect("default bind addr is valid")
            });

        let model_timeout = env_opt("MODEL_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS));

        Self {
            model_api_key: env_opt("MODEL_API_KEY"),
            model_base_url: env_opt("MODEL_BASE_URL")
                .unwrap_or_else(|| DEFAULT_MODEL_BASE_URL.to_string()),
            model_name: env_opt("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            model_timeout,
            context_api_url: env_opt("CONTEXT_API_URL")
                .unwrap_or_else(|| DEFAULT_CONTEXT_API_URL.to_string()),
            bind_addr,
        }
    }
}
