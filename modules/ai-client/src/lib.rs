//! Text and image generation client for the recipe pipeline.
//!
//! One OpenAI-compatible client, two text cost tiers (fast vs. capable) and
//! an image endpoint that surfaces rate limiting as a typed error so callers
//! can implement their own backoff policy.

mod client;
mod error;
mod types;

pub mod traits;
pub mod util;

pub use client::OpenAiClient;
pub use error::AiError;
pub use traits::{ImageGenerate, TextGenerate};
pub use types::{
    AspectRatio, GeneratedImage, ImageFormat, ImageRequest, ModelTier, TextRequest,
};
