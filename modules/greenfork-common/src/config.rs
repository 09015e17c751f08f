use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::types::PLACEHOLDER_IMAGE;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Record store
    pub database_url: String,

    // AI provider
    pub openai_api_key: String,
    pub fast_model: String,
    pub capable_model: String,
    pub image_model: String,

    // Images
    pub image_dir: PathBuf,
    pub placeholder_image: String,

    // HTTP
    pub http_timeout_secs: u64,

    // API server
    pub api_host: String,
    pub api_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            openai_api_key: required_env("OPENAI_API_KEY"),
            fast_model: env::var("FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            capable_model: env::var("CAPABLE_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            image_model: env::var("IMAGE_MODEL").unwrap_or_else(|_| "gpt-image-1".to_string()),
            image_dir: env::var("IMAGE_DIR")
                .unwrap_or_else(|_| "public/images/recipes".to_string())
                .into(),
            placeholder_image: env::var("PLACEHOLDER_IMAGE")
                .unwrap_or_else(|_| PLACEHOLDER_IMAGE.to_string()),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("HTTP_TIMEOUT_SECS must be a number"),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("API_PORT must be a number"),
        }
    }

    /// Log the loaded configuration without secrets.
    pub fn log_redacted(&self) {
        info!(
            fast_model = %self.fast_model,
            capable_model = %self.capable_model,
            image_model = %self.image_model,
            image_dir = %self.image_dir.display(),
            placeholder_image = %self.placeholder_image,
            http_timeout_secs = self.http_timeout_secs,
            api_host = %self.api_host,
            api_port = self.api_port,
            "Config loaded (keys redacted)"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
