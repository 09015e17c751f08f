use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use greenfork_common::{slugify, RecipeDraft, StoredRecipe};
use greenfork_store::{RecipeStore, StoreError};

/// Identity assignment seam, injected so tests get deterministic ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Default: random v4 UUIDs, never reused.
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Sole creator of StoredRecipe records. Guarantees a globally unique slug
/// by suffix probing before the write.
pub struct Persister {
    store: Arc<dyn RecipeStore>,
    ids: Arc<dyn IdGenerator>,
}

impl Persister {
    pub fn new(store: Arc<dyn RecipeStore>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { store, ids }
    }

    /// Write a draft as a new stored recipe. Errors surface to the caller;
    /// there is no retry here.
    pub async fn persist(&self, draft: RecipeDraft) -> Result<StoredRecipe, StoreError> {
        let base = slugify(&draft.title);
        let slug = self.unique_slug(&base).await?;

        let stored = StoredRecipe {
            id: self.ids.next_id(),
            slug,
            recipe: draft,
            date_published: Utc::now(),
            image: String::new(),
            nutrition: None,
            faqs: vec![],
        };

        self.store.create(&stored).await?;
        info!(slug = %stored.slug, title = %stored.recipe.title, "Recipe persisted");
        Ok(stored)
    }

    /// Probe `base`, `base-1`, `base-2`, … until a free slug is found.
    /// Terminates in O(existing collisions) probes.
    async fn unique_slug(&self, base: &str) -> Result<String, StoreError> {
        if !self.store.slug_exists(base).await? {
            return Ok(base.to_string());
        }
        let mut suffix = 1u32;
        loop {
            let candidate = format!("{base}-{suffix}");
            if !self.store.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }
}
