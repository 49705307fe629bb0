use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::provider::{
    BatchRateRequest, BatchRateResponse, PairResult, ProviderFuture, RateProvider,
};
use crate::{CalendarDate, CurrencyCode, FetchFailure, RatePoint};

/// Public Frankfurter reference-rate API.
pub const FRANKFURTER_API_URL: &str = "https://api.frankfurter.app";

/// Upstream lookup in Frankfurter's URL vocabulary.
///
/// | Dates given | Path |
/// |-------------|------|
/// | start and end | `/{start}..{end}` |
/// | start only | `/{start}` |
/// | none | `/latest` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrankfurterQuery {
    pub base: CurrencyCode,
    pub targets: Vec<CurrencyCode>,
    pub start_date: Option<CalendarDate>,
    pub end_date: Option<CalendarDate>,
}

impl FrankfurterQuery {
    /// A `/latest` lookup for every currency until dates or targets are set.
    pub fn new(base: CurrencyCode) -> Self {
        Self {
            base,
            targets: Vec::new(),
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_targets(mut self, targets: Vec<CurrencyCode>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_dates(
        mut self,
        start_date: Option<CalendarDate>,
        end_date: Option<CalendarDate>,
    ) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    pub fn path(&self) -> String {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => format!("/{start}..{end}"),
            (Some(start), None) => format!("/{start}"),
            _ => String::from("/latest"),
        }
    }

    pub fn url(&self, base_url: &str) -> String {
        let mut url = format!(
            "{}{}?from={}",
            base_url.trim_end_matches('/'),
            self.path(),
            urlencoding::encode(self.base.as_str())
        );
        if !self.targets.is_empty() {
            let joined = self
                .targets
                .iter()
                .map(|code| code.as_str())
                .collect::<Vec<_>>()
                .join(",");
            url.push_str("&to=");
            url.push_str(&urlencoding::encode(&joined));
        }
        url
    }
}

#[derive(Debug, Deserialize)]
struct FrankfurterSeries {
    #[serde(default)]
    rates: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct FrankfurterErrorBody {
    message: Option<String>,
}

/// Adapter talking to the Frankfurter API directly.
///
/// Pairs that share a base and date range go out as one upstream call with
/// a comma-separated `to` list and are split back into per-target results.
#[derive(Clone)]
pub struct FrankfurterProvider {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), FRANKFURTER_API_URL)
    }
}

impl FrankfurterProvider {
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

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run an upstream lookup and return its JSON body untouched.
    pub async fn fetch_raw(&self, query: &FrankfurterQuery) -> Result<serde_json::Value, FetchFailure> {
        let body = self.get(query).await?;
        serde_json::from_str(&body)
            .map_err(|e| FetchFailure::decode(format!("failed to parse frankfurter response: {e}")))
    }

    async fn get(&self, query: &FrankfurterQuery) -> Result<String, FetchFailure> {
        let url = query.url(&self.base_url);
        debug!(%url, "frankfurter request");
        let request = HttpRequest::get(url).with_timeout_ms(self.timeout_ms);
        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            let message = serde_json::from_str::<FrankfurterErrorBody>(&response.body)
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("frankfurter returned status {}", response.status));
            return Err(FetchFailure::provider(message, Some(response.status)));
        }

        Ok(response.body)
    }

    async fn fetch_group(&self, query: FrankfurterQuery) -> Result<Vec<PairResult>, FetchFailure> {
        let body = self.get(&query).await?;
        let series: FrankfurterSeries = serde_json::from_str(&body)
            .map_err(|e| FetchFailure::decode(format!("failed to parse frankfurter series: {e}")))?;

        let mut per_target: BTreeMap<CurrencyCode, Vec<RatePoint>> = BTreeMap::new();
        for (raw_date, rates) in series.rates {
            let date = CalendarDate::parse(&raw_date)
                .map_err(|e| FetchFailure::decode(format!("frankfurter date key: {e}")))?;
            for target in &query.targets {
                if let Some(rate) = rates.get(target.as_str()) {
                    per_target
                        .entry(*target)
                        .or_default()
                        .push(RatePoint::new(date, *rate));
                }
            }
        }

        Ok(query
            .targets
            .iter()
            .map(|target| PairResult::new(*target, per_target.remove(target).unwrap_or_default()))
            .collect())
    }
}

impl RateProvider for FrankfurterProvider {
    fn name(&self) -> &'static str {
        "frankfurter"
    }

    fn fetch_batch<'a>(&'a self, request: &'a BatchRateRequest) -> ProviderFuture<'a> {
        Box::pin(async move {
            let mut groups: Vec<FrankfurterQuery> = Vec::new();
            for pair in &request.pairs {
                let existing = groups.iter_mut().find(|group| {
                    group.base == pair.base
                        && group.start_date == Some(pair.start_date)
                        && group.end_date == Some(pair.end_date)
                });
                match existing {
                    Some(group) => {
                        if !group.targets.contains(&pair.target) {
                            group.targets.push(pair.target);
                        }
                    }
                    None => groups.push(
                        FrankfurterQuery::new(pair.base)
                            .with_targets(vec![pair.target])
                            .with_dates(Some(pair.start_date), Some(pair.end_date)),
                    ),
                }
            }

            let mut results = Vec::with_capacity(request.pairs.len());
            for group in groups {
                results.extend(self.fetch_group(group).await?);
            }

            Ok(BatchRateResponse::ok(results))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::http_client::{HttpFuture, HttpResponse};
    use crate::{DateRange, FetchFailureKind};

    struct RecordingClient {
        response: HttpResponse,
        urls: Mutex<Vec<String>>,
    }

    impl RecordingClient {
        fn new(response: HttpResponse) -> Arc<Self> {
            Arc::new(Self {
                response,
                urls: Mutex::new(Vec::new()),
            })
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().expect("lock").clone()
        }
    }

    impl HttpClient for RecordingClient {
        fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
            self.urls.lock().expect("lock").push(request.url);
            let response = self.response.clone();
            Box::pin(async move { Ok(response) })
        }
    }

    fn date(input: &str) -> CalendarDate {
        CalendarDate::parse(input).expect("test date")
    }

    #[test]
    fn query_paths_follow_upstream_conventions() {
        let latest = FrankfurterQuery::new(CurrencyCode::Usd);
        assert_eq!(latest.path(), "/latest");

        let single = latest.clone().with_dates(Some(date("2024-01-02")), None);
        assert_eq!(single.path(), "/2024-01-02");

        let range = latest
            .with_targets(vec![CurrencyCode::Eur, CurrencyCode::Cad])
            .with_dates(Some(date("2024-01-01")), Some(date("2024-01-31")));
        assert_eq!(
            range.url("https://api.frankfurter.app/"),
            "https://api.frankfurter.app/2024-01-01..2024-01-31?from=USD&to=EUR%2CCAD"
        );
    }

    #[tokio::test]
    async fn batches_pairs_into_one_call_and_splits_per_target() {
        let client = RecordingClient::new(HttpResponse::ok_json(
            r#"{"amount":1.0,"base":"USD","start_date":"2024-01-01","end_date":"2024-01-02",
               "rates":{"2024-01-01":{"EUR":0.91,"CAD":1.33},"2024-01-02":{"EUR":0.92}}}"#,
        ));
        let provider = FrankfurterProvider::with_http_client(client.clone(), "http://upstream.test");
        let range = DateRange::parse("2024-01-01", "2024-01-02").expect("valid range");
        let request = BatchRateRequest::for_targets(
            CurrencyCode::Usd,
            &[CurrencyCode::Eur, CurrencyCode::Cad],
            &range,
        );

        let response = provider.fetch_batch(&request).await.expect("batch should succeed");

        assert_eq!(client.urls().len(), 1);
        assert!(response.success);
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].target_currency, "EUR");
        assert_eq!(response.results[0].data.len(), 2);
        assert_eq!(response.results[1].target_currency, "CAD");
        assert_eq!(response.results[1].data.len(), 1);
    }

    #[tokio::test]
    async fn non_success_status_becomes_provider_failure_with_status() {
        let client = RecordingClient::new(HttpResponse::with_status(404, r#"{"message":"not found"}"#));
        let provider = FrankfurterProvider::with_http_client(client, "http://upstream.test");

        let failure = provider
            .fetch_raw(&FrankfurterQuery::new(CurrencyCode::Usd))
            .await
            .expect_err("404 must fail");

        assert_eq!(failure.kind(), FetchFailureKind::Provider);
        assert_eq!(failure.status(), Some(404));
        assert_eq!(failure.message(), "not found");
    }
}
