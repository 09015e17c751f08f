use async_trait::async_trait;

use crate::error::Result;
use crate::types::{GeneratedImage, ImageRequest, TextRequest};

/// Text-generation seam. The pipeline codes against this so tests can swap
/// in canned responses without a network.
#[async_trait]
pub trait TextGenerate: Send + Sync {
    async fn generate(&self, request: &TextRequest) -> Result<String>;
}

/// Image-generation seam. Rate limiting must surface as
/// `AiError::RateLimited` so callers can drive their own retry policy.
#[async_trait]
pub trait ImageGenerate: Send + Sync {
    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage>;
}
