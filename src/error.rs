use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum StackTrackError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] duckdb::Error),

    #[error("Store unavailable: connection busy for more than {0:?}")]
    StoreBusy(Duration),

    #[error("Store corrupt: {0}")]
    StoreCorrupt(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[source] reqwest::Error),

    #[error("Upstream error {status}: {body}")]
    UpstreamError { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StackTrackError {
    /// Whether the caller may retry the same operation unchanged.
    ///
    /// Only transient store and transport failures qualify; validation,
    /// authorization and non-2xx upstream answers are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StackTrackError::StoreUnavailable(_)
                | StackTrackError::StoreBusy(_)
                | StackTrackError::UpstreamUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StackTrackError>;
