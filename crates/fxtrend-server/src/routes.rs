//! HTTP routes.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Liveness probe |
//! | GET | `/api/rates` | Single upstream lookup, body passed through |
//! | POST | `/api/rates/batch` | Many pairs in one call, one series per pair |

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fxtrend_core::{
    validate_range, BatchRateRequest, BatchRateResponse, CalendarDate, CurrencyCode,
    FrankfurterQuery, RateProvider,
};
use serde::Deserialize;
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, error};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health).fallback(method_not_allowed))
        .route("/api/rates", get(rates).fallback(method_not_allowed))
        .route(
            "/api/rates/batch",
            post(batch_rates).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .with_state(state)
}

async fn health() -> Json<Value> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    Json(json!({
        "status": "healthy",
        "service": "currency-exchange-api",
        "timestamp": timestamp,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct RatesParams {
    base: Option<String>,
    target: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

/// Treat blank parameters as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn parse_date(value: &Option<String>, name: &'static str) -> Result<Option<CalendarDate>, ApiError> {
    present(value)
        .map(CalendarDate::parse)
        .transpose()
        .map_err(|error| ApiError::InvalidParameter {
            name,
            message: error.to_string(),
        })
}

async fn rates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RatesParams>,
) -> Result<Json<Value>, ApiError> {
    let base = present(&params.base)
        .ok_or(ApiError::MissingParameter { name: "base" })?
        .parse::<CurrencyCode>()
        .map_err(|error| ApiError::InvalidParameter {
            name: "base",
            message: error.to_string(),
        })?;
    let targets = match present(&params.target) {
        Some(raw) => {
            CurrencyCode::parse_list(raw).map_err(|error| ApiError::InvalidParameter {
                name: "target",
                message: error.to_string(),
            })?
        }
        None => Vec::new(),
    };
    let start_date = parse_date(&params.start_date, "start_date")?;
    let end_date = parse_date(&params.end_date, "end_date")?;

    let lookup = FrankfurterQuery::new(base)
        .with_targets(targets)
        .with_dates(start_date, end_date);
    debug!(path = %lookup.path(), %base, "rates lookup");

    let data = state
        .frankfurter
        .fetch_raw(&lookup)
        .await
        .map_err(ApiError::Upstream)?;

    Ok(Json(json!({ "success": true, "data": data })))
}

async fn batch_rates(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BatchRateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;

    for pair in &request.pairs {
        validate_range(pair.start_date, pair.end_date).map_err(|error| {
            ApiError::InvalidParameter {
                name: "pairs",
                message: format!("{}/{}: {error}", pair.base, pair.target),
            }
        })?;
    }

    debug!(pairs = request.pairs.len(), "batch lookup");
    match state.frankfurter.fetch_batch(&request).await {
        Ok(response) => Ok(Json(response).into_response()),
        Err(failure) => {
            error!(%failure, "external API error");
            let response = BatchRateResponse::failure(
                "External API error",
                "Failed to fetch data from Frankfurt API",
            )
            .with_details(failure.to_string());
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response())
        }
    }
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use fxtrend_core::http_client::HttpFuture;
    use fxtrend_core::{HttpClient, HttpError, HttpRequest, HttpResponse};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ServerConfig;

    /// Upstream double that records every URL and answers with one response.
    struct FakeUpstream {
        response: Result<HttpResponse, HttpError>,
        urls: Mutex<Vec<String>>,
    }

    impl FakeUpstream {
        fn new(response: Result<HttpResponse, HttpError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                urls: Mutex::new(Vec::new()),
            })
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().expect("lock").clone()
        }
    }

    impl HttpClient for FakeUpstream {
        fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
            self.urls.lock().expect("lock").push(request.url);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn app(upstream: Arc<FakeUpstream>) -> Router {
        let config = ServerConfig {
            upstream_url: String::from("http://upstream.test"),
            ..ServerConfig::default()
        };
        router(AppState::with_http_client(config, upstream))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("infallible service");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    const SERIES: &str = r#"{"amount":1.0,"base":"USD","start_date":"2024-01-01","end_date":"2024-01-02",
        "rates":{"2024-01-01":{"EUR":0.91,"CAD":1.33},"2024-01-02":{"EUR":0.92,"CAD":1.34}}}"#;

    #[tokio::test]
    async fn health_reports_service_name() {
        let (status, body) = send(
            app(FakeUpstream::new(Ok(HttpResponse::ok_json("{}")))),
            get_request("/health"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "currency-exchange-api");
        assert!(body["timestamp"].as_str().is_some_and(|ts| !ts.is_empty()));
    }

    #[tokio::test]
    async fn missing_base_is_a_bad_request() {
        let upstream = FakeUpstream::new(Ok(HttpResponse::ok_json("{}")));
        let (status, body) = send(app(upstream.clone()), get_request("/api/rates?target=EUR")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing required parameter: base");
        assert!(upstream.urls().is_empty());
    }

    #[tokio::test]
    async fn rates_forward_range_lookup_and_wrap_the_body() {
        let upstream = FakeUpstream::new(Ok(HttpResponse::ok_json(SERIES)));
        let (status, body) = send(
            app(upstream.clone()),
            get_request("/api/rates?base=usd&target=eur&start_date=2024-01-01&end_date=2024-01-02"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["rates"]["2024-01-02"]["EUR"], 0.92);
        assert_eq!(
            upstream.urls(),
            ["http://upstream.test/2024-01-01..2024-01-02?from=USD&to=EUR"]
        );
    }

    #[tokio::test]
    async fn rates_without_dates_use_latest() {
        let upstream = FakeUpstream::new(Ok(HttpResponse::ok_json(SERIES)));
        send(app(upstream.clone()), get_request("/api/rates?base=EUR")).await;
        assert_eq!(upstream.urls(), ["http://upstream.test/latest?from=EUR"]);
    }

    #[tokio::test]
    async fn upstream_failure_is_reported_with_details() {
        let upstream = FakeUpstream::new(Err(HttpError::connect("connection refused")));
        let (status, body) = send(app(upstream), get_request("/api/rates?base=USD")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "External API error");
        assert_eq!(body["message"], "Failed to fetch data from Frankfurt API");
        assert!(body["details"]
            .as_str()
            .is_some_and(|details| details.contains("connection refused")));
    }

    #[tokio::test]
    async fn batch_returns_one_series_per_pair() {
        let upstream = FakeUpstream::new(Ok(HttpResponse::ok_json(SERIES)));
        let body = json!({
            "pairs": [
                {"base": "USD", "target": "EUR", "start_date": "2024-01-01", "end_date": "2024-01-02"},
                {"base": "USD", "target": "CAD", "start_date": "2024-01-01", "end_date": "2024-01-02"}
            ]
        });
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/rates/batch")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");

        let (status, body) = send(app(upstream.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        let response: BatchRateResponse = serde_json::from_value(body).expect("batch response");
        assert!(response.success);
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[1].target_currency, "CAD");
        assert_eq!(response.results[1].data.len(), 2);
        assert_eq!(upstream.urls().len(), 1);
    }

    #[tokio::test]
    async fn batch_rejects_ranges_over_two_years() {
        let upstream = FakeUpstream::new(Ok(HttpResponse::ok_json(SERIES)));
        let body = json!({
            "pairs": [
                {"base": "USD", "target": "EUR", "start_date": "2020-01-01", "end_date": "2024-01-01"}
            ]
        });
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/rates/batch")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");

        let (status, _) = send(app(upstream.clone()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(upstream.urls().is_empty());
    }

    #[tokio::test]
    async fn unknown_paths_and_wrong_methods_get_json_errors() {
        let upstream = FakeUpstream::new(Ok(HttpResponse::ok_json("{}")));

        let (status, body) = send(app(upstream.clone()), get_request("/api/unknown")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");

        let delete = Request::builder()
            .method(Method::DELETE)
            .uri("/api/rates")
            .body(Body::empty())
            .expect("request");
        let (status, body) = send(app(upstream), delete).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
    }
}
