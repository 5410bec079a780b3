use thiserror::Error;

pub type WebProResult<T> = Result<T, WebProError>;

#[derive(Error, Debug)]
pub enum WebProError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} from {path}")]
    Status { status: u16, path: String },

    #[error("Request to {path} timed out after {timeout_ms}ms")]
    Timeout { path: String, timeout_ms: u64 },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Empty result from {0}")]
    EmptyResult(String),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl WebProError {
    /// Errors raised by the live fetch path that the adapters absorb by
    /// substituting synthetic data.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WebProError::Transport(_)
                | WebProError::Status { .. }
                | WebProError::Timeout { .. }
                | WebProError::MalformedPayload(_)
                | WebProError::EmptyResult(_)
                | WebProError::Serialization(_)
        )
    }
}
