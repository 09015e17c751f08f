//! The record-store seam for the recipe pipeline.
//!
//! The pipeline treats storage as an opaque collaborator addressable by id
//! and unique slug. `RecipeStore` is that contract; `PgRecipeStore` backs it
//! with Postgres, `MemoryRecipeStore` backs tests and local dry runs.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;
use greenfork_common::{Faq, Ingredient, InstructionStep, Nutrition, StoredRecipe};
use uuid::Uuid;

pub use error::{Result, StoreError};
pub use memory::MemoryRecipeStore;
pub use postgres::PgRecipeStore;

/// A stored title/slug pair, as returned by the duplicate-detection lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMatch {
    pub title: String,
    pub slug: String,
}

/// Top-level scalar fields the fix applier may patch individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    Description,
    Prologue,
    Tips,
    Storage,
    IngredientNotes,
    Image,
    Nutrition,
}

impl ScalarField {
    pub fn column(self) -> &'static str {
        match self {
            ScalarField::Description => "description",
            ScalarField::Prologue => "prologue",
            ScalarField::Tips => "tips",
            ScalarField::Storage => "storage",
            ScalarField::IngredientNotes => "ingredient_notes",
            ScalarField::Image => "image",
            ScalarField::Nutrition => "nutrition",
        }
    }
}

/// Value for a scalar patch. Nutrition is the one non-text scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Nutrition(Nutrition),
}

/// Opaque record store keyed by id and unique slug.
///
/// Creation writes the record and all child collections as one logical unit.
/// Collection updates are replace-all; partial merges of child rows are not
/// supported.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Persist a new recipe and all child collections atomically.
    async fn create(&self, recipe: &StoredRecipe) -> Result<()>;

    async fn fetch_by_id(&self, id: Uuid) -> Result<Option<StoredRecipe>>;

    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<StoredRecipe>>;

    async fn slug_exists(&self, slug: &str) -> Result<bool>;

    /// Case-insensitive exact title match.
    async fn find_title_exact(&self, normalized_title: &str) -> Result<Option<TitleMatch>>;

    /// All stored titles containing the given token (case-insensitive).
    async fn find_titles_with_token(&self, token: &str) -> Result<Vec<TitleMatch>>;

    /// Corpus listing in publication order, optionally capped.
    async fn list(&self, limit: Option<u32>) -> Result<Vec<StoredRecipe>>;

    async fn update_scalar(&self, id: Uuid, field: ScalarField, value: ScalarValue)
        -> Result<()>;

    async fn replace_tags(&self, id: Uuid, tags: &[String]) -> Result<()>;

    async fn replace_faqs(&self, id: Uuid, faqs: &[Faq]) -> Result<()>;

    async fn replace_ingredients(&self, id: Uuid, ingredients: &[Ingredient]) -> Result<()>;

    async fn replace_instructions(&self, id: Uuid, instructions: &[InstructionStep])
        -> Result<()>;
}
