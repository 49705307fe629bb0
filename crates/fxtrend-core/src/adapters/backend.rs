use std::sync::Arc;

use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::provider::{BatchRateRequest, BatchRateResponse, ProviderFuture, RateProvider};
use crate::FetchFailure;

/// Path of the batch endpoint exposed by `fxtrend-server`.
pub const BATCH_RATES_PATH: &str = "/api/rates/batch";

/// Adapter for the fxtrend rate proxy (`fxtrend-server`).
#[derive(Clone)]
pub struct BackendProvider {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl BackendProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), base_url)
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            timeout_ms: 10_000,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}{BATCH_RATES_PATH}", self.base_url.trim_end_matches('/'))
    }
}

impl RateProvider for BackendProvider {
    fn name(&self) -> &'static str {
        "backend"
    }

    fn fetch_batch<'a>(&'a self, request: &'a BatchRateRequest) -> ProviderFuture<'a> {
        Box::pin(async move {
            let body = serde_json::to_string(request)
                .map_err(|e| FetchFailure::decode(format!("failed to encode batch request: {e}")))?;
            let endpoint = self.endpoint();
            debug!(%endpoint, pairs = request.pairs.len(), "backend batch request");

            let http_request = HttpRequest::post_json(endpoint, body).with_timeout_ms(self.timeout_ms);
            let response = self.http_client.execute(http_request).await?;

            // The backend reports failures as JSON bodies on non-2xx statuses too.
            let decoded = serde_json::from_str::<BatchRateResponse>(&response.body);
            match decoded {
                Ok(batch) if batch.success && response.is_success() => Ok(batch),
                Ok(batch) => Err(FetchFailure::provider(
                    batch.failure_message(),
                    Some(response.status),
                )),
                Err(_) if !response.is_success() => Err(FetchFailure::provider(
                    format!("backend returned status {}", response.status),
                    Some(response.status),
                )),
                Err(e) => Err(FetchFailure::decode(format!(
                    "failed to parse backend response: {e}"
                ))),
            }
        })
    }
}
