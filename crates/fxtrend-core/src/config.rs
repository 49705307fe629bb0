use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{
    BackendProvider, FrankfurterProvider, StubRateProvider, FRANKFURTER_API_URL,
};
use crate::fetch_client::{RateFetchClient, DEFAULT_REQUEST_TIMEOUT};
use crate::http_client::ReqwestHttpClient;
use crate::orchestrator::DEFAULT_DEBOUNCE;
use crate::provider::RateProvider;

/// Dashboard settings derived from `FXTREND_*` environment variables.
///
/// | Variable | Default |
/// |----------|---------|
/// | `FXTREND_FRANKFURTER_URL` | `https://api.frankfurter.app` |
/// | `FXTREND_BACKEND_URL` | unset (talk to Frankfurter directly) |
/// | `FXTREND_REQUEST_TIMEOUT_MS` | `10000` |
/// | `FXTREND_DEBOUNCE_MS` | `500` |
/// | `FXTREND_STORAGE_DIR` | `$XDG_DATA_HOME/fxtrend`, else `~/.local/share/fxtrend` |
/// | `FXTREND_MOCK` | `false` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub frankfurter_url: String,
    /// Batch proxy to use instead of calling Frankfurter directly.
    pub backend_url: Option<String>,
    pub request_timeout: Duration,
    pub debounce: Duration,
    pub storage_dir: PathBuf,
    /// Serve synthetic rates without any network access.
    pub mock: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank or unparsable values
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let millis = |name: &str, default: Duration| {
            text(name)
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            frankfurter_url: text("FXTREND_FRANKFURTER_URL")
                .unwrap_or_else(|| FRANKFURTER_API_URL.to_string()),
            backend_url: text("FXTREND_BACKEND_URL"),
            request_timeout: millis("FXTREND_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT),
            debounce: millis("FXTREND_DEBOUNCE_MS", DEFAULT_DEBOUNCE),
            storage_dir: text("FXTREND_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| default_storage_dir(&text)),
            mock: text("FXTREND_MOCK")
                .map(|value| {
                    matches!(
                        value.to_lowercase().as_str(),
                        "1" | "true" | "yes" | "y" | "on"
                    )
                })
                .unwrap_or(false),
        }
    }

    /// Provider selected by these settings: stub, batch proxy, or Frankfurter.
    pub fn provider(&self) -> Arc<dyn RateProvider> {
        let timeout_ms = u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX);
        if self.mock {
            return Arc::new(StubRateProvider);
        }

        let http_client = Arc::new(ReqwestHttpClient::new());
        match &self.backend_url {
            Some(url) => Arc::new(
                BackendProvider::with_http_client(http_client, url.clone())
                    .with_timeout_ms(timeout_ms),
            ),
            None => Arc::new(
                FrankfurterProvider::with_http_client(http_client, self.frankfurter_url.clone())
                    .with_timeout_ms(timeout_ms),
            ),
        }
    }

    pub fn fetch_client(&self) -> RateFetchClient {
        RateFetchClient::new(self.provider()).with_timeout(self.request_timeout)
    }
}

fn default_storage_dir(text: &impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(data_home) = text("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join("fxtrend");
    }
    if let Some(home) = text("HOME") {
        return PathBuf::from(home).join(".local/share/fxtrend");
    }
    PathBuf::from(".fxtrend")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> DashboardConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        DashboardConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_without_variables() {
        let config = config(&[]);
        assert_eq!(config.frankfurter_url, FRANKFURTER_API_URL);
        assert_eq!(config.backend_url, None);
        assert_eq!(config.request_timeout, Duration::from_millis(10_000));
        assert_eq!(config.debounce, Duration::from_millis(500));
        assert_eq!(config.storage_dir, PathBuf::from(".fxtrend"));
        assert!(!config.mock);
    }

    #[test]
    fn variables_override_and_bad_numbers_fall_back() {
        let config = config(&[
            ("FXTREND_BACKEND_URL", " http://localhost:3001 "),
            ("FXTREND_REQUEST_TIMEOUT_MS", "2500"),
            ("FXTREND_DEBOUNCE_MS", "soon"),
            ("HOME", "/home/dev"),
            ("FXTREND_MOCK", "yes"),
        ]);

        assert_eq!(config.backend_url.as_deref(), Some("http://localhost:3001"));
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.debounce, DEFAULT_DEBOUNCE);
        assert_eq!(config.storage_dir, PathBuf::from("/home/dev/.local/share/fxtrend"));
        assert!(config.mock);
    }

    #[test]
    fn mock_selects_the_stub_provider() {
        let provider = config(&[("FXTREND_MOCK", "1")]).provider();
        assert_eq!(provider.name(), "stub");
    }
}
