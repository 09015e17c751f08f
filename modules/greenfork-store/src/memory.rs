// In-memory RecipeStore used by unit tests and local dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use greenfork_common::{Faq, Ingredient, InstructionStep, StoredRecipe};

use crate::error::{Result, StoreError};
use crate::{RecipeStore, ScalarField, ScalarValue, TitleMatch};

#[derive(Default)]
struct Inner {
    recipes: HashMap<Uuid, StoredRecipe>,
    /// Creation order, so `list` is stable like the Postgres ordering.
    order: Vec<Uuid>,
}

#[derive(Default)]
pub struct MemoryRecipeStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail, for exercising fail-open paths.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn create(&self, recipe: &StoredRecipe) -> Result<()> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        if inner.recipes.values().any(|r| r.slug == recipe.slug) {
            return Err(StoreError::Unavailable(format!(
                "slug already taken: {}",
                recipe.slug
            )));
        }
        inner.order.push(recipe.id);
        inner.recipes.insert(recipe.id, recipe.clone());
        Ok(())
    }

    async fn fetch_by_id(&self, id: Uuid) -> Result<Option<StoredRecipe>> {
        self.check_available()?;
        Ok(self.inner.read().await.recipes.get(&id).cloned())
    }

    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<StoredRecipe>> {
        self.check_available()?;
        Ok(self
            .inner
            .read()
            .await
            .recipes
            .values()
            .find(|r| r.slug == slug)
            .cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        self.check_available()?;
        Ok(self
            .inner
            .read()
            .await
            .recipes
            .values()
            .any(|r| r.slug == slug))
    }

    async fn find_title_exact(&self, normalized_title: &str) -> Result<Option<TitleMatch>> {
        self.check_available()?;
        Ok(self
            .inner
            .read()
            .await
            .recipes
            .values()
            .find(|r| r.recipe.title.to_lowercase() == normalized_title)
            .map(|r| TitleMatch {
                title: r.recipe.title.clone(),
                slug: r.slug.clone(),
            }))
    }

    async fn find_titles_with_token(&self, token: &str) -> Result<Vec<TitleMatch>> {
        self.check_available()?;
        let token = token.to_lowercase();
        Ok(self
            .inner
            .read()
            .await
            .recipes
            .values()
            .filter(|r| r.recipe.title.to_lowercase().contains(&token))
            .map(|r| TitleMatch {
                title: r.recipe.title.clone(),
                slug: r.slug.clone(),
            })
            .collect())
    }

    async fn list(&self, limit: Option<u32>) -> Result<Vec<StoredRecipe>> {
        self.check_available()?;
        let inner = self.inner.read().await;
        let cap = limit.map(|n| n as usize).unwrap_or(usize::MAX);
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.recipes.get(id).cloned())
            .take(cap)
            .collect())
    }

    async fn update_scalar(
        &self,
        id: Uuid,
        field: ScalarField,
        value: ScalarValue,
    ) -> Result<()> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        let recipe = inner
            .recipes
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        match (field, value) {
            (ScalarField::Description, ScalarValue::Text(v)) => recipe.recipe.description = v,
            (ScalarField::Prologue, ScalarValue::Text(v)) => recipe.recipe.prologue = v,
            (ScalarField::Tips, ScalarValue::Text(v)) => recipe.recipe.tips = Some(v),
            (ScalarField::Storage, ScalarValue::Text(v)) => recipe.recipe.storage = Some(v),
            (ScalarField::IngredientNotes, ScalarValue::Text(v)) => {
                recipe.recipe.ingredient_notes = Some(v)
            }
            (ScalarField::Image, ScalarValue::Text(v)) => recipe.image = v,
            (ScalarField::Nutrition, ScalarValue::Nutrition(n)) => recipe.nutrition = Some(n),
            (field, value) => {
                return Err(StoreError::Unavailable(format!(
                    "type mismatch for {:?}: {:?}",
                    field, value
                )))
            }
        }
        Ok(())
    }

    async fn replace_tags(&self, id: Uuid, tags: &[String]) -> Result<()> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        let recipe = inner
            .recipes
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        recipe.recipe.tags = tags.to_vec();
        Ok(())
    }

    async fn replace_faqs(&self, id: Uuid, faqs: &[Faq]) -> Result<()> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        let recipe = inner
            .recipes
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        recipe.faqs = faqs.to_vec();
        Ok(())
    }

    async fn replace_ingredients(&self, id: Uuid, ingredients: &[Ingredient]) -> Result<()> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        let recipe = inner
            .recipes
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        recipe.recipe.ingredients = ingredients.to_vec();
        Ok(())
    }

    async fn replace_instructions(
        &self,
        id: Uuid,
        instructions: &[InstructionStep],
    ) -> Result<()> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        let recipe = inner
            .recipes
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        recipe.recipe.instructions = instructions.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use greenfork_common::{Difficulty, RecipeDraft};

    fn recipe(id: u128, title: &str, slug: &str) -> StoredRecipe {
        StoredRecipe {
            id: Uuid::from_u128(id),
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

    #[tokio::test]
    async fn create_then_lookup_by_slug_and_id() {
        let store = MemoryRecipeStore::new();
        let r = recipe(1, "Vegan Pho", "vegan-pho");
        store.create(&r).await.unwrap();

        assert!(store.slug_exists("vegan-pho").await.unwrap());
        assert!(!store.slug_exists("vegan-ramen").await.unwrap());
        assert_eq!(store.fetch_by_id(r.id).await.unwrap().unwrap().slug, "vegan-pho");
        assert!(store.fetch_by_slug("vegan-ramen").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn title_queries_are_case_insensitive() {
        let store = MemoryRecipeStore::new();
        store.create(&recipe(1, "Vegan Pho", "vegan-pho")).await.unwrap();

        let exact = store.find_title_exact("vegan pho").await.unwrap().unwrap();
        assert_eq!(exact.slug, "vegan-pho");

        let matches = store.find_titles_with_token("PHO").await.unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn list_preserves_creation_order_and_limit() {
        let store = MemoryRecipeStore::new();
        store.create(&recipe(1, "Vegan Pho", "vegan-pho")).await.unwrap();
        store.create(&recipe(2, "Vegan Ramen", "vegan-ramen")).await.unwrap();
        store.create(&recipe(3, "Vegan Laksa", "vegan-laksa")).await.unwrap();

        let all = store.list(None).await.unwrap();
        assert_eq!(
            all.iter().map(|r| r.slug.as_str()).collect::<Vec<_>>(),
            vec!["vegan-pho", "vegan-ramen", "vegan-laksa"]
        );

        let capped = store.list(Some(2)).await.unwrap();
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_slug_create_is_rejected() {
        let store = MemoryRecipeStore::new();
        store.create(&recipe(1, "Vegan Pho", "vegan-pho")).await.unwrap();
        let dup = recipe(2, "Vegan Pho Again", "vegan-pho");
        assert!(store.create(&dup).await.is_err());
    }

    #[tokio::test]
    async fn scalar_update_targets_one_field() {
        let store = MemoryRecipeStore::new();
        let r = recipe(1, "Vegan Pho", "vegan-pho");
        store.create(&r).await.unwrap();

        store
            .update_scalar(
                r.id,
                ScalarField::Description,
                ScalarValue::Text("Aromatic broth over rice noodles.".to_string()),
            )
            .await
            .unwrap();

        let after = store.fetch_by_id(r.id).await.unwrap().unwrap();
        assert_eq!(after.recipe.description, "Aromatic broth over rice noodles.");
        assert_eq!(after.recipe.prologue, r.recipe.prologue);
    }
}
