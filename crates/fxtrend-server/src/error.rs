use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fxtrend_core::FetchFailure;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Unified error type for API responses.
///
/// Every variant renders as `{success: false, error, message}`, plus
/// `details` for upstream failures.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required parameter: {name}")]
    MissingParameter { name: &'static str },

    #[error("Invalid parameter: {name}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("Invalid request body")]
    InvalidBody(String),

    #[error("External API error")]
    Upstream(#[source] FetchFailure),

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter { .. } | Self::InvalidParameter { .. } | Self::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::MissingParameter { name } if *name == "base" => {
                String::from("Base currency code is required (USD, CAD, EUR, etc.)")
            }
            Self::MissingParameter { name } => format!("Parameter '{name}' is required"),
            Self::InvalidParameter { message, .. } => message.clone(),
            Self::InvalidBody(message) => message.clone(),
            Self::Upstream(_) => String::from("Failed to fetch data from Frankfurt API"),
            Self::NotFound => String::from("The requested endpoint does not exist"),
            Self::MethodNotAllowed => {
                String::from("The HTTP method is not allowed for this endpoint")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "error": self.to_string(),
            "message": self.message(),
        });
        if let Self::Upstream(failure) = &self {
            error!(%failure, "external API error");
            body["details"] = json!(failure.to_string());
        }

        (self.status(), Json(body)).into_response()
    }
}
