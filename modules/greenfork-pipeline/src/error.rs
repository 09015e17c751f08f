use ai_client::AiError;
use greenfork_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Neither strict JSON parsing nor the fenced-block fallback produced a
    /// recipe object.
    #[error("unparsable response")]
    Unparsable,

    #[error("text generation failed: {0}")]
    Generation(#[from] AiError),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),
}
