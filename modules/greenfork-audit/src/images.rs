//! Hero-image resolution: CheckExisting → Generate → Backoff⟲ → Fallback.
//!
//! The one place in the pipeline with real retry discipline. Rate limits are
//! retried up to 3 attempts with additive-linear delay built from the
//! provider's own Retry-After hint; everything else degrades straight to the
//! shared placeholder. The resolver always returns a usable path.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use ai_client::util::truncate_chars;
use ai_client::{AiError, GeneratedImage, ImageGenerate, ImageRequest};
use greenfork_common::slugify;

/// Total generation attempts before falling back to the placeholder.
pub const MAX_IMAGE_ATTEMPTS: u32 = 3;

/// Description text beyond this adds nothing to an image prompt.
const MAX_PROMPT_DESCRIPTION_CHARS: usize = 300;

/// Web path prefix for files in the image directory.
const IMAGE_URL_PREFIX: &str = "/images/recipes";

/// Backoff before the next attempt: the provider's Retry-After hint in
/// milliseconds, plus a linearly growing margin per attempt. Additive-linear
/// by contract, not exponential.
pub fn backoff_delay(retry_after_secs: Option<u64>, attempt: u32) -> Duration {
    let hint_ms = retry_after_secs.unwrap_or(1) * 1000;
    Duration::from_millis(hint_ms + attempt as u64 * 2000)
}

/// How a usable image path was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Found on disk; no cost incurred.
    Existing(String),
    /// Newly generated and persisted.
    Generated(String),
    /// Generation failed; shared placeholder returned.
    Placeholder(String),
}

impl ImageOutcome {
    pub fn path(&self) -> &str {
        match self {
            ImageOutcome::Existing(p)
            | ImageOutcome::Generated(p)
            | ImageOutcome::Placeholder(p) => p,
        }
    }
}

pub struct ImageResolver {
    generator: Arc<dyn ImageGenerate>,
    http: reqwest::Client,
    image_dir: PathBuf,
    placeholder: String,
}

impl ImageResolver {
    pub fn new(generator: Arc<dyn ImageGenerate>, image_dir: PathBuf, placeholder: String) -> Self {
        Self {
            generator,
            http: reqwest::Client::new(),
            image_dir,
            placeholder,
        }
    }

    /// Find or generate a hero image. Never fails; the end state is always
    /// a usable path.
    pub async fn resolve(&self, title: &str, description: &str) -> ImageOutcome {
        let prefix = slugify(title);

        if let Some(existing) = self.find_existing(&prefix).await {
            info!(title, path = %existing, "Existing image found");
            return ImageOutcome::Existing(existing);
        }

        let request = ImageRequest::new(format!(
            "Professional food photography of {title}, overhead shot, natural light, \
             styled on a rustic table. {}",
            truncate_chars(description, MAX_PROMPT_DESCRIPTION_CHARS)
        ));

        for attempt in 0..MAX_IMAGE_ATTEMPTS {
            match self.generator.generate_image(&request).await {
                Ok(image) => match self.persist(&prefix, image, &request).await {
                    Some(path) => {
                        info!(title, path = %path, attempt, "Image generated");
                        return ImageOutcome::Generated(path);
                    }
                    None => break,
                },
                Err(AiError::RateLimited { retry_after_secs }) => {
                    let delay = backoff_delay(retry_after_secs, attempt);
                    warn!(
                        title,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Image generation rate limited; backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(title, error = %e, "Image generation failed");
                    break;
                }
            }
        }

        warn!(title, "Falling back to placeholder image");
        ImageOutcome::Placeholder(self.placeholder.clone())
    }

    /// Scan the image directory for a filename with this title's slug prefix.
    async fn find_existing(&self, prefix: &str) -> Option<String> {
        let mut entries = tokio::fs::read_dir(&self.image_dir).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(prefix) {
                return Some(format!("{IMAGE_URL_PREFIX}/{name}"));
            }
        }
        None
    }

    /// Write generated bytes (downloading first if the provider returned a
    /// URL) and return the public path. None means the fallback should run.
    async fn persist(
        &self,
        prefix: &str,
        image: GeneratedImage,
        request: &ImageRequest,
    ) -> Option<String> {
        let bytes = match image {
            GeneratedImage::Bytes(bytes) => bytes,
            GeneratedImage::Url(url) => match self.download(&url).await {
                Some(bytes) => bytes,
                None => return None,
            },
        };

        let file_name = format!("{prefix}.{}", request.output_format.extension());
        if let Err(e) = tokio::fs::create_dir_all(&self.image_dir).await {
            warn!(error = %e, dir = %self.image_dir.display(), "Image dir unavailable");
            return None;
        }
        let target = self.image_dir.join(&file_name);
        if let Err(e) = tokio::fs::write(&target, &bytes).await {
            warn!(error = %e, path = %target.display(), "Image write failed");
            return None;
        }
        Some(format!("{IMAGE_URL_PREFIX}/{file_name}"))
    }

    async fn download(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self.http.get(url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!(url, status = %r.status(), "Image download failed");
                return None;
            }
            Err(e) => {
                warn!(url, error = %e, "Image download failed");
                return None;
            }
        };
        response.bytes().await.ok().map(|b| b.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_is_additive_linear_on_the_provider_hint() {
        assert_eq!(backoff_delay(Some(5), 0), Duration::from_millis(5000));
        assert_eq!(backoff_delay(Some(5), 1), Duration::from_millis(7000));
        assert_eq!(backoff_delay(Some(5), 2), Duration::from_millis(9000));
    }

    #[test]
    fn backoff_defaults_the_missing_hint() {
        assert_eq!(backoff_delay(None, 0), Duration::from_millis(1000));
        assert_eq!(backoff_delay(None, 2), Duration::from_millis(5000));
    }

    struct AlwaysRateLimited {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ImageGenerate for AlwaysRateLimited {
        async fn generate_image(
            &self,
            _request: &ImageRequest,
        ) -> Result<GeneratedImage, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AiError::RateLimited {
                retry_after_secs: Some(2),
            })
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl ImageGenerate for AlwaysFails {
        async fn generate_image(
            &self,
            _request: &ImageRequest,
        ) -> Result<GeneratedImage, AiError> {
            Err(AiError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        }
    }

    struct OnePixel;

    #[async_trait]
    impl ImageGenerate for OnePixel {
        async fn generate_image(
            &self,
            _request: &ImageRequest,
        ) -> Result<GeneratedImage, AiError> {
            Ok(GeneratedImage::Bytes(vec![0x89, 0x50, 0x4e, 0x47]))
        }
    }

    fn resolver(generator: Arc<dyn ImageGenerate>, dir: PathBuf) -> ImageResolver {
        ImageResolver::new(generator, dir, "/images/recipes/placeholder.jpg".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limits_retry_then_fall_back_to_placeholder() {
        let generator = Arc::new(AlwaysRateLimited {
            calls: AtomicU32::new(0),
        });
        let dir = std::env::temp_dir().join("greenfork-test-missing-dir");
        let r = resolver(generator.clone(), dir);

        let outcome = r.resolve("Vegan Beef Stew", "A hearty stew").await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), MAX_IMAGE_ATTEMPTS);
        assert_eq!(
            outcome,
            ImageOutcome::Placeholder("/images/recipes/placeholder.jpg".to_string())
        );
    }

    #[tokio::test]
    async fn non_rate_limit_error_skips_retries() {
        let dir = std::env::temp_dir().join("greenfork-test-missing-dir");
        let r = resolver(Arc::new(AlwaysFails), dir);

        let outcome = r.resolve("Vegan Beef Stew", "A hearty stew").await;
        assert!(matches!(outcome, ImageOutcome::Placeholder(_)));
    }

    #[tokio::test]
    async fn generated_bytes_are_persisted_under_the_slug() {
        let dir = tempfile::tempdir().unwrap();
        let r = resolver(Arc::new(OnePixel), dir.path().to_path_buf());

        let outcome = r.resolve("Vegan Beef Stew", "A hearty stew").await;
        assert_eq!(
            outcome,
            ImageOutcome::Generated("/images/recipes/vegan-beef-stew.png".to_string())
        );
        assert!(dir.path().join("vegan-beef-stew.png").exists());
    }

    #[tokio::test]
    async fn existing_file_short_circuits_generation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vegan-beef-stew-hero.png"), b"png").unwrap();

        // A generator that would panic if called.
        struct Unreachable;
        #[async_trait]
        impl ImageGenerate for Unreachable {
            async fn generate_image(
                &self,
                _request: &ImageRequest,
            ) -> Result<GeneratedImage, AiError> {
                panic!("generation must not run when a file exists");
            }
        }

        let r = resolver(Arc::new(Unreachable), dir.path().to_path_buf());
        let outcome = r.resolve("Vegan Beef Stew", "A hearty stew").await;
        assert_eq!(
            outcome,
            ImageOutcome::Existing("/images/recipes/vegan-beef-stew-hero.png".to_string())
        );
    }
}
