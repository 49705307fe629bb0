use std::sync::Arc;

use fxtrend_core::{FrankfurterProvider, HttpClient, ReqwestHttpClient};

use crate::config::ServerConfig;

/// Shared application state, passed to all route handlers via `axum::extract::State`.
pub struct AppState {
    pub config: ServerConfig,
    pub frankfurter: FrankfurterProvider,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    /// State whose upstream calls go through `http_client`.
    pub fn with_http_client(config: ServerConfig, http_client: Arc<dyn HttpClient>) -> Arc<Self> {
        let frankfurter =
            FrankfurterProvider::with_http_client(http_client, config.upstream_url.clone())
                .with_timeout_ms(config.upstream_timeout_ms);
        Arc::new(Self {
            config,
            frankfurter,
        })
    }
}
