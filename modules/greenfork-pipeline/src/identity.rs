//! Duplicate detection: does a semantically equivalent recipe already exist?
//!
//! Deliberately cheap and imperfect. Missed duplicates are acceptable;
//! blocking a legitimately distinct recipe is the failure mode to avoid,
//! hence the high similarity bar and the token prefilter. The check is also
//! a read-then-write race with the persister: two concurrent ingestions of
//! the same logical recipe can both pass and both persist. That is accepted
//! at-least-one semantics, not a bug; the store's unique slug constraint
//! keeps the records addressable either way.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use greenfork_common::{jaccard_similarity, normalize_title, significant_tokens, TtlCache};
use greenfork_store::{RecipeStore, TitleMatch};

/// A candidate must beat this Jaccard score to count as a duplicate.
pub const DUPLICATE_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Outcome of a duplicate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCheck {
    pub exists: bool,
    pub slug: Option<String>,
}

impl DuplicateCheck {
    fn not_found() -> Self {
        Self {
            exists: false,
            slug: None,
        }
    }

    fn found(slug: String) -> Self {
        Self {
            exists: true,
            slug: Some(slug),
        }
    }
}

pub struct IdentityResolver {
    store: Arc<dyn RecipeStore>,
    /// Token → stored title matches. Injected, bounded-lifetime state; the
    /// audit scan and ingestion bursts hit the same tokens repeatedly.
    token_cache: Mutex<TtlCache<String, Vec<TitleMatch>>>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn RecipeStore>, cache_ttl: Duration) -> Self {
        Self {
            store,
            token_cache: Mutex::new(TtlCache::new(cache_ttl)),
        }
    }

    /// Resolve a proposed title against the stored corpus.
    ///
    /// Store failures fail open: ingestion proceeds rather than blocking on
    /// an unavailable duplicate check.
    pub async fn resolve(&self, proposed_title: &str) -> DuplicateCheck {
        let normalized = normalize_title(proposed_title);
        if normalized.is_empty() {
            return DuplicateCheck::not_found();
        }

        match self.store.find_title_exact(&normalized).await {
            Ok(Some(m)) => {
                debug!(title = %proposed_title, slug = %m.slug, "Exact title match");
                return DuplicateCheck::found(m.slug);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Exact title lookup failed; failing open");
                return DuplicateCheck::not_found();
            }
        }

        // Score every stored title sharing any significant token and keep
        // the best match, rather than stopping at the first candidate.
        let mut best: Option<(f64, TitleMatch)> = None;
        for token in significant_tokens(&normalized) {
            let candidates = match self.candidates_for(token).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(error = %e, token, "Token lookup failed; failing open");
                    return DuplicateCheck::not_found();
                }
            };

            for candidate in candidates {
                let similarity =
                    jaccard_similarity(&normalized, &normalize_title(&candidate.title));
                if best.as_ref().is_none_or(|(s, _)| similarity > *s) {
                    best = Some((similarity, candidate));
                }
            }
        }

        match best {
            Some((similarity, candidate)) if similarity > DUPLICATE_SIMILARITY_THRESHOLD => {
                debug!(
                    title = %proposed_title,
                    matched = %candidate.title,
                    similarity,
                    "Fuzzy duplicate"
                );
                DuplicateCheck::found(candidate.slug)
            }
            _ => DuplicateCheck::not_found(),
        }
    }

    async fn candidates_for(&self, token: &str) -> Result<Vec<TitleMatch>, greenfork_store::StoreError> {
        let key = token.to_string();
        if let Some(cached) = self.token_cache.lock().await.get(&key) {
            return Ok(cached);
        }
        let candidates = self.store.find_titles_with_token(token).await?;
        self.token_cache
            .lock()
            .await
            .insert(key, candidates.clone());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use greenfork_common::{Difficulty, RecipeDraft, StoredRecipe};
    use greenfork_store::MemoryRecipeStore;
    use uuid::Uuid;

    fn stored(title: &str, slug: &str) -> StoredRecipe {
        StoredRecipe {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            recipe: RecipeDraft {
                title: title.to_string(),
                description: String::new(),
                prologue: String::new(),
                prep_time: 0,
                cook_time: 0,
                total_time: 0,
                servings: 4,
                difficulty: Difficulty::Medium,
                categories: vec![],
                ingredients: vec![],
                instructions: vec![],
                tags: vec![],
                tips: None,
                variations: None,
                storage: None,
                ingredient_notes: None,
                original_url: String::new(),
            },
            date_published: Utc::now(),
            image: String::new(),
            nutrition: None,
            faqs: vec![],
        }
    }

    fn resolver(store: Arc<MemoryRecipeStore>) -> IdentityResolver {
        IdentityResolver::new(store, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn exact_match_is_duplicate() {
        let store = Arc::new(MemoryRecipeStore::new());
        store
            .create(&stored("Vegan Beef Stew", "vegan-beef-stew"))
            .await
            .unwrap();

        let check = resolver(store).resolve("  vegan BEEF stew ").await;
        assert!(check.exists);
        assert_eq!(check.slug.as_deref(), Some("vegan-beef-stew"));
    }

    #[tokio::test]
    async fn near_identical_title_is_fuzzy_duplicate() {
        let store = Arc::new(MemoryRecipeStore::new());
        store
            .create(&stored(
                "Vegan Chocolate Chip Cookies Recipe",
                "vegan-chocolate-chip-cookies-recipe",
            ))
            .await
            .unwrap();

        // 4 of 5 tokens shared → similarity 0.8+ after the extra token.
        let check = resolver(store)
            .resolve("Vegan Chocolate Chip Cookies Recipe Deluxe")
            .await;
        assert!(check.exists);
    }

    #[tokio::test]
    async fn distinct_recipe_is_not_blocked() {
        let store = Arc::new(MemoryRecipeStore::new());
        store
            .create(&stored("Vegan Chocolate Chip Cookies", "ccc"))
            .await
            .unwrap();

        let check = resolver(store).resolve("Vegan Banana Bread").await;
        assert!(!check.exists);
        assert!(check.slug.is_none());
    }

    #[tokio::test]
    async fn moderate_overlap_stays_below_threshold() {
        let store = Arc::new(MemoryRecipeStore::new());
        store
            .create(&stored("Vegan Chocolate Cake", "vegan-chocolate-cake"))
            .await
            .unwrap();

        // Shares "vegan"/"chocolate" but similarity is only 0.5.
        let check = resolver(store).resolve("Vegan Chocolate Pudding").await;
        assert!(!check.exists);
    }

    #[tokio::test]
    async fn store_failure_fails_open() {
        let store = Arc::new(MemoryRecipeStore::new());
        store
            .create(&stored("Vegan Beef Stew", "vegan-beef-stew"))
            .await
            .unwrap();
        store.set_unavailable(true);

        let check = resolver(store).resolve("Vegan Beef Stew").await;
        assert!(!check.exists);
    }
}
