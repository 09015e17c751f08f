use serde::{Deserialize, Serialize};

// =============================================================================
// Request Types
// =============================================================================

/// Cost tier for text generation. The fast tier handles mechanical fills
/// (tags, FAQs, notes); the capable tier handles rewriting tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Fast,
    Capable,
}

/// One bounded text-generation request.
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub tier: ModelTier,
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider for a single JSON object response.
    pub json: bool,
}

impl TextRequest {
    pub fn new(tier: ModelTier, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            tier,
            system: system.into(),
            prompt: prompt.into(),
            temperature: 0.7,
            max_tokens: 4096,
            json: false,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Square,
    Landscape,
    Portrait,
}

impl AspectRatio {
    /// Provider size string for this ratio.
    pub(crate) fn size(self) -> &'static str {
        match self {
            AspectRatio::Square => "1024x1024",
            AspectRatio::Landscape => "1536x1024",
            AspectRatio::Portrait => "1024x1536",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Webp,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
        }
    }
}

/// One image-generation request.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub output_format: ImageFormat,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: AspectRatio::Landscape,
            output_format: ImageFormat::Png,
        }
    }
}

/// What the image endpoint handed back: decoded bytes, or a URL the caller
/// must download itself.
#[derive(Debug, Clone)]
pub enum GeneratedImage {
    Bytes(Vec<u8>),
    Url(String),
}

// =============================================================================
// Wire Types (OpenAI-compatible)
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage {
    pub role: &'static str,
    pub content: String,
}

impl WireMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageGenRequest {
    pub model: String,
    pub prompt: String,
    pub n: u8,
    pub size: String,
    pub output_format: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageGenResponse {
    pub data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageDatum {
    pub b64_json: Option<String>,
    pub url: Option<String>,
}
