use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use ai_client::TextGenerate;
use greenfork_common::RecipeDraft;
use greenfork_store::RecipeStore;

use crate::error::PipelineError;
use crate::extract::extract_recipe_text;
use crate::fetch::PageSource;
use crate::identity::IdentityResolver;
use crate::persist::{IdGenerator, Persister};
use crate::transform::Transformer;

/// Submitted URLs longer than this are rejected outright.
const MAX_URL_LEN: usize = 2048;

/// Duplicate-check token lookups stay warm for this long.
const TITLE_CACHE_TTL: Duration = Duration::from_secs(300);

/// Public response of the ingestion trigger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub recipe: Option<RecipeDraft>,
    pub original_url: String,
    pub saved: bool,
    pub already_exists: bool,
    pub recipe_url: Option<String>,
}

/// The veganize flow end to end. One sequential pass per request.
pub struct IngestService {
    fetcher: Arc<dyn PageSource>,
    transformer: Transformer,
    identity: IdentityResolver,
    persister: Persister,
}

impl IngestService {
    pub fn new(
        fetcher: Arc<dyn PageSource>,
        generator: Arc<dyn TextGenerate>,
        store: Arc<dyn RecipeStore>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            fetcher,
            transformer: Transformer::new(generator),
            identity: IdentityResolver::new(store.clone(), TITLE_CACHE_TTL),
            persister: Persister::new(store, ids),
        }
    }

    /// Ingest one source URL. Fetch and transform failures abort; a
    /// persistence failure degrades to "content produced, nothing saved".
    pub async fn ingest(&self, url: &str) -> Result<IngestResponse, PipelineError> {
        validate_url(url)?;

        let html = self.fetcher.fetch(url).await?;
        let text = extract_recipe_text(&html);
        info!(url, extracted_chars = text.chars().count(), "Extracted page text");

        let draft = self.transformer.veganize(&text, url).await?;

        let check = self.identity.resolve(&draft.title).await;
        if check.exists {
            info!(title = %draft.title, slug = ?check.slug, "Recipe already exists");
            return Ok(IngestResponse {
                success: true,
                original_url: url.to_string(),
                saved: false,
                already_exists: true,
                recipe_url: check.slug.map(|s| format!("/recipes/{s}")),
                recipe: Some(draft),
            });
        }

        match self.persister.persist(draft.clone()).await {
            Ok(stored) => Ok(IngestResponse {
                success: true,
                recipe: Some(stored.recipe),
                original_url: url.to_string(),
                saved: true,
                already_exists: false,
                recipe_url: Some(format!("/recipes/{}", stored.slug)),
            }),
            Err(e) => {
                // The user still gets the veganized content, just no link.
                warn!(error = %e, url, "Persist failed; returning unsaved recipe");
                Ok(IngestResponse {
                    success: true,
                    recipe: Some(draft),
                    original_url: url.to_string(),
                    saved: false,
                    already_exists: false,
                    recipe_url: None,
                })
            }
        }
    }
}

fn validate_url(url: &str) -> Result<(), PipelineError> {
    if url.trim().is_empty() || url.len() > MAX_URL_LEN {
        return Err(PipelineError::InvalidUrl);
    }
    let parsed = url::Url::parse(url).map_err(|_| PipelineError::InvalidUrl)?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(PipelineError::InvalidUrl);
    }
    Ok(())
}
