use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use tracing::debug;

use crate::error::{AiError, Result};
use crate::traits::{ImageGenerate, TextGenerate};
use crate::types::*;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

const DEFAULT_FAST_MODEL: &str = "gpt-4o-mini";
const DEFAULT_CAPABLE_MODEL: &str = "gpt-4o";
const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";

/// OpenAI-compatible client covering both text tiers and image generation.
pub struct OpenAiClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
    fast_model: String,
    capable_model: String,
    image_model: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: OPENAI_API_URL.to_string(),
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            capable_model: DEFAULT_CAPABLE_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn with_text_models(mut self, fast: &str, capable: &str) -> Self {
        self.fast_model = fast.to_string();
        self.capable_model = capable.to_string();
        self
    }

    pub fn with_image_model(mut self, model: &str) -> Self {
        self.image_model = model.to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
                AiError::Api {
                    status: 0,
                    message: "API key contains invalid header characters".to_string(),
                }
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Capable => &self.capable_model,
        }
    }

    /// Convert a non-2xx response into a typed error, reading the
    /// Retry-After hint on 429s.
    async fn error_from(response: reqwest::Response) -> AiError {
        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return AiError::RateLimited { retry_after_secs };
        }
        let message = response.text().await.unwrap_or_default();
        AiError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl TextGenerate for OpenAiClient {
    async fn generate(&self, request: &TextRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let model = self.model_for(request.tier);

        debug!(model, json = request.json, "Text generation request");

        let wire = ChatRequest {
            model: model.to_string(),
            messages: vec![
                WireMessage::system(&request.system),
                WireMessage::user(&request.prompt),
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json.then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&wire)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

#[async_trait]
impl ImageGenerate for OpenAiClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        let url = format!("{}/images/generations", self.base_url);

        debug!(model = %self.image_model, "Image generation request");

        let wire = ImageGenRequest {
            model: self.image_model.clone(),
            prompt: request.prompt.clone(),
            n: 1,
            size: request.aspect_ratio.size().to_string(),
            output_format: request.output_format.extension().to_string(),
        };

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&wire)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let payload: ImageGenResponse = response.json().await?;
        let datum = payload
            .data
            .into_iter()
            .next()
            .ok_or(AiError::EmptyResponse)?;

        if let Some(b64) = datum.b64_json {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(b64.as_bytes())
                .map_err(|e| AiError::InvalidImagePayload(e.to_string()))?;
            return Ok(GeneratedImage::Bytes(bytes));
        }
        if let Some(url) = datum.url {
            return Ok(GeneratedImage::Url(url));
        }
        Err(AiError::InvalidImagePayload(
            "response carried neither b64_json nor url".to_string(),
        ))
    }
}
