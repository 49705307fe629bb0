use std::env;

use fxtrend_core::FRANKFURTER_API_URL;

/// Server configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Frankfurter-compatible API every lookup is forwarded to.
    pub upstream_url: String,
    pub upstream_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: String::from("0.0.0.0"),
            port: 5000,
            upstream_url: FRANKFURTER_API_URL.to_string(),
            upstream_timeout_ms: 10_000,
        }
    }
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind: env_str("FXTREND_BIND", &defaults.bind),
            port: env_u16("FXTREND_PORT", defaults.port),
            upstream_url: env_str("FXTREND_UPSTREAM_URL", &defaults.upstream_url),
            upstream_timeout_ms: env_u64(
                "FXTREND_UPSTREAM_TIMEOUT_MS",
                defaults.upstream_timeout_ms,
            ),
        }
    }
}
