/// Result type alias for AI calls.
pub type Result<T> = std::result::Result<T, AiError>;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// Provider throttled the request. Carries the Retry-After hint when the
    /// provider sent one.
    #[error("rate limited by provider (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned no content")]
    EmptyResponse,

    #[error("invalid image payload: {0}")]
    InvalidImagePayload(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl AiError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AiError::RateLimited { .. })
    }
}
