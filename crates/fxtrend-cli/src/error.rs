use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] fxtrend_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] fxtrend_core::FetchFailure),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Persistence(#[from] fxtrend_core::PersistenceError),

    #[error("value for '{key}' was not saved")]
    NotPersisted { key: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Command(_) => 2,
            Self::Fetch(_) => 3,
            Self::Serialization(_) => 4,
            Self::Persistence(_) => 6,
            Self::NotPersisted { .. } => 6,
            Self::Io(_) => 10,
        }
    }
}
