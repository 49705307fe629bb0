use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors raised by domain constructors and setters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported currency code '{value}'")]
    InvalidCurrency { value: String },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: String, end: String },
    #[error("date range spans {days} days, maximum is {max_days}")]
    RangeTooLong { days: i64, max_days: i64 },

    #[error("at most {max} currencies may be selected, got {count}")]
    TooManyCurrencies { count: usize, max: usize },
    #[error("currency {code} is already selected")]
    DuplicateCurrency { code: String },

    #[error("page size {value} is not one of 10, 25, 50, 100")]
    InvalidPageSize { value: usize },
    #[error("unknown grid column '{value}'")]
    InvalidColumn { value: String },
}

/// Failure classification for rate fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailureKind {
    /// The provider answered but reported `success: false` or a non-2xx status.
    Provider,
    Transport,
    Timeout,
    /// The provider payload could not be decoded.
    Decode,
}

impl FetchFailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::Decode => "decode",
        }
    }
}

impl Display for FetchFailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-visible network/provider error, retryable through a manual refetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    kind: FetchFailureKind,
    message: String,
    status: Option<u16>,
}

impl FetchFailure {
    pub fn provider(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            kind: FetchFailureKind::Provider,
            message: message.into(),
            status,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FetchFailureKind::Transport,
            message: message.into(),
            status: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: FetchFailureKind::Timeout,
            message: message.into(),
            status: None,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: FetchFailureKind::Decode,
            message: message.into(),
            status: None,
        }
    }

    pub const fn kind(&self) -> FetchFailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Decode failures will not go away by asking again.
    pub const fn retryable(&self) -> bool {
        !matches!(self.kind, FetchFailureKind::Decode)
    }
}

impl Display for FetchFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} error (status {status}): {}", self.kind, self.message),
            None => write!(f, "{} error: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for FetchFailure {}

/// Storage read/write/parse failures. Always absorbed by the store layer.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage io error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stored value for key '{key}' is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage quota exceeded writing '{key}': {len} bytes, quota {quota}")]
    QuotaExceeded { key: String, len: usize, quota: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_failure_display_includes_status_when_present() {
        let failure = FetchFailure::provider("upstream rejected pair", Some(502));
        assert_eq!(
            failure.to_string(),
            "provider error (status 502): upstream rejected pair"
        );
        assert!(failure.retryable());
    }

    #[test]
    fn decode_failures_are_not_retryable() {
        let failure = FetchFailure::decode("missing rates");
        assert_eq!(failure.kind(), FetchFailureKind::Decode);
        assert!(!failure.retryable());
        assert_eq!(failure.status(), None);
    }
}
