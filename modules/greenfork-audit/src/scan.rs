//! The corpus scan: Auditor → Planner → (Image Resolver | text repair) →
//! Fix Applier, strictly in sequence per recipe.
//!
//! Recipes are processed one at a time so AI rate-limit pressure stays
//! predictable and cost accounting stays simple. One bad recipe never
//! aborts the run; its failure is logged and the scan moves on.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use uuid::Uuid;

use ai_client::{ImageGenerate, TextGenerate};
use greenfork_common::{RecipePatch, StoredRecipe};
use greenfork_store::RecipeStore;

use crate::apply::FixApplier;
use crate::auditor::audit;
use crate::error::AuditError;
use crate::images::{ImageOutcome, ImageResolver};
use crate::planner::RepairPlanner;

/// Scan scope and behavior flags, mirrored by the CLI surface.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub dry_run: bool,
    pub limit: Option<u32>,
    pub recipe_id: Option<Uuid>,
    pub recipe_slug: Option<String>,
    pub skip_images: bool,
    pub skip_nutrition: bool,
}

/// Totals for one scan, logged at completion.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub scanned: u32,
    pub clean: u32,
    pub repaired: u32,
    pub failed: u32,
    pub images_generated: u32,
    pub placeholders: u32,
}

impl std::fmt::Display for ScanStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scanned={} clean={} repaired={} failed={} images_generated={} placeholders={}",
            self.scanned,
            self.clean,
            self.repaired,
            self.failed,
            self.images_generated,
            self.placeholders
        )
    }
}

pub struct AuditScan {
    store: Arc<dyn RecipeStore>,
    planner: RepairPlanner,
    images: ImageResolver,
}

impl AuditScan {
    pub fn new(
        store: Arc<dyn RecipeStore>,
        text: Arc<dyn TextGenerate>,
        image: Arc<dyn ImageGenerate>,
        image_dir: PathBuf,
        placeholder: String,
    ) -> Self {
        Self {
            store,
            planner: RepairPlanner::new(text),
            images: ImageResolver::new(image, image_dir, placeholder),
        }
    }

    /// Run the scan. Setup failures (store unreachable) propagate; any
    /// single recipe's repair failure is logged and counted.
    pub async fn run(&self, options: &ScanOptions) -> Result<ScanStats> {
        let recipes = self.select(options).await?;
        info!(
            count = recipes.len(),
            dry_run = options.dry_run,
            "Audit scan starting"
        );

        let applier = FixApplier::new(self.store.clone(), options.dry_run);
        let mut stats = ScanStats::default();

        for recipe in recipes {
            stats.scanned += 1;
            let report = audit(&recipe);
            if !report.has_issues() {
                stats.clean += 1;
                continue;
            }

            match self.repair_one(&recipe, &applier, options).await {
                Ok(outcome) => {
                    stats.repaired += 1;
                    match outcome {
                        Some(ImageOutcome::Generated(_)) => stats.images_generated += 1,
                        Some(ImageOutcome::Placeholder(_)) => stats.placeholders += 1,
                        _ => {}
                    }
                }
                Err(e) => {
                    error!(slug = %recipe.slug, error = %e, "Repair failed; continuing scan");
                    stats.failed += 1;
                }
            }
        }

        info!(%stats, "Audit scan complete");
        Ok(stats)
    }

    async fn select(&self, options: &ScanOptions) -> Result<Vec<StoredRecipe>> {
        if let Some(id) = options.recipe_id {
            return Ok(self.store.fetch_by_id(id).await?.into_iter().collect());
        }
        if let Some(slug) = &options.recipe_slug {
            return Ok(self.store.fetch_by_slug(slug).await?.into_iter().collect());
        }
        Ok(self.store.list(options.limit).await?)
    }

    /// One recipe: text repair and/or image resolution, then a single apply.
    async fn repair_one(
        &self,
        recipe: &StoredRecipe,
        applier: &FixApplier,
        options: &ScanOptions,
    ) -> Result<Option<ImageOutcome>, AuditError> {
        let report = audit(recipe);

        let mut patch = self
            .planner
            .repair(recipe, &report, options.skip_nutrition)
            .await?
            .unwrap_or_else(RecipePatch::default);

        let mut image_outcome = None;
        if report.missing_image && !options.skip_images {
            if options.dry_run {
                // Generation is paid; a dry run only reports the gap.
                info!(slug = %recipe.slug, "Dry run: would resolve hero image");
            } else {
                let outcome = self
                    .images
                    .resolve(&recipe.recipe.title, &recipe.recipe.description)
                    .await;
                patch.image = Some(outcome.path().to_string());
                image_outcome = Some(outcome);
            }
        }

        applier.apply(recipe, &patch).await?;
        Ok(image_outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{healthy_recipe, sparse_recipe};
    use ai_client::{AiError, GeneratedImage, ImageRequest, TextRequest};
    use async_trait::async_trait;
    use greenfork_store::MemoryRecipeStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    const FULL_PATCH: &str = r#"{
        "description": "A hearty seitan and root-vegetable stew for cold nights.",
        "prologue": "There is a particular kind of hunger that only a slow-simmered stew answers, and this one answers it without any beef at all — seitan goes burnished and savory in the pot.",
        "tips": "Brown the seitan hard before the liquid goes in.",
        "storage": "Keeps 4 days refrigerated.",
        "ingredientNotes": "Any firm seitan works here.",
        "nutrition": {"calories": 340, "protein": "21g", "carbs": "32g", "fat": "11g"},
        "faqs": [{"question": "Can I freeze it?", "answer": "Yes, up to 3 months."}],
        "tags": ["stew", "seitan", "winter", "one-pot", "hearty"]
    }"#;

    struct CannedText(&'static str, AtomicU32);

    #[async_trait]
    impl TextGenerate for CannedText {
        async fn generate(&self, _request: &TextRequest) -> Result<String, AiError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.to_string())
        }
    }

    struct NoImage;

    #[async_trait]
    impl ImageGenerate for NoImage {
        async fn generate_image(
            &self,
            _request: &ImageRequest,
        ) -> Result<GeneratedImage, AiError> {
            Err(AiError::Api {
                status: 500,
                message: "image service down".to_string(),
            })
        }
    }

    fn scan(store: Arc<MemoryRecipeStore>, text: Arc<CannedText>) -> AuditScan {
        AuditScan::new(
            store,
            text,
            Arc::new(NoImage),
            std::env::temp_dir().join("greenfork-scan-test-missing"),
            "/images/recipes/placeholder.jpg".to_string(),
        )
    }

    #[tokio::test]
    async fn clean_corpus_spends_no_ai_budget() {
        let store = Arc::new(MemoryRecipeStore::new());
        store.create(&healthy_recipe()).await.unwrap();
        let text = Arc::new(CannedText(FULL_PATCH, AtomicU32::new(0)));

        let stats = scan(store, text.clone())
            .run(&ScanOptions::default())
            .await
            .unwrap();

        assert_eq!(stats.scanned, 1);
        assert_eq!(stats.clean, 1);
        assert_eq!(stats.repaired, 0);
        assert_eq!(text.1.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn broken_recipe_is_repaired_and_counted() {
        let store = Arc::new(MemoryRecipeStore::new());
        let recipe = sparse_recipe();
        store.create(&recipe).await.unwrap();
        let text = Arc::new(CannedText(FULL_PATCH, AtomicU32::new(0)));

        let options = ScanOptions {
            dry_run: false,
            ..Default::default()
        };
        let stats = scan(store.clone(), text).run(&options).await.unwrap();

        assert_eq!(stats.repaired, 1);
        assert_eq!(stats.placeholders, 1);
        assert_eq!(stats.failed, 0);

        let after = store.fetch_by_id(recipe.id).await.unwrap().unwrap();
        assert_eq!(after.recipe.tags.len(), 5);
        assert!(after.nutrition.is_some());
        assert!(!after.faqs.is_empty());
        assert_eq!(after.image, "/images/recipes/placeholder.jpg");
    }

    #[tokio::test]
    async fn bad_patch_response_fails_one_recipe_not_the_scan() {
        let store = Arc::new(MemoryRecipeStore::new());
        let broken = sparse_recipe();
        store.create(&broken).await.unwrap();
        store.create(&healthy_recipe()).await.unwrap();
        let text = Arc::new(CannedText("not json at all", AtomicU32::new(0)));

        let options = ScanOptions {
            dry_run: false,
            ..Default::default()
        };
        let stats = scan(store, text).run(&options).await.unwrap();

        assert_eq!(stats.scanned, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.clean, 1);
    }

    #[tokio::test]
    async fn dry_run_repairs_nothing() {
        let store = Arc::new(MemoryRecipeStore::new());
        let recipe = sparse_recipe();
        store.create(&recipe).await.unwrap();
        let text = Arc::new(CannedText(FULL_PATCH, AtomicU32::new(0)));

        let options = ScanOptions {
            dry_run: true,
            ..Default::default()
        };
        scan(store.clone(), text).run(&options).await.unwrap();

        let after = store.fetch_by_id(recipe.id).await.unwrap().unwrap();
        assert_eq!(after, recipe);
    }

    #[tokio::test]
    async fn slug_scoped_scan_touches_only_that_recipe() {
        let store = Arc::new(MemoryRecipeStore::new());
        let target = sparse_recipe();
        store.create(&target).await.unwrap();
        let mut other = sparse_recipe();
        other.id = Uuid::from_u128(99);
        other.slug = "vegan-chili".to_string();
        other.recipe.title = "Vegan Chili".to_string();
        store.create(&other).await.unwrap();

        let text = Arc::new(CannedText(FULL_PATCH, AtomicU32::new(0)));
        let options = ScanOptions {
            dry_run: false,
            recipe_slug: Some(target.slug.clone()),
            ..Default::default()
        };
        let stats = scan(store.clone(), text).run(&options).await.unwrap();

        assert_eq!(stats.scanned, 1);
        let untouched = store.fetch_by_id(other.id).await.unwrap().unwrap();
        assert_eq!(untouched, other);
    }

    #[tokio::test]
    async fn setup_failure_propagates() {
        let store = Arc::new(MemoryRecipeStore::new());
        store.set_unavailable(true);
        let text = Arc::new(CannedText(FULL_PATCH, AtomicU32::new(0)));

        let result = scan(store, text).run(&ScanOptions::default()).await;
        assert!(result.is_err());
    }
}
