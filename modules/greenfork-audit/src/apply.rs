//! Idempotent, field-by-field merge of repair patches into the store.
//!
//! Scalars present in the patch overwrite; child collections present in the
//! patch replace wholesale (delete + insert); partial merges of collections
//! are not supported. An empty incoming value never clobbers a populated,
//! non-placeholder field.

use std::sync::Arc;

use tracing::{info, warn};

use greenfork_common::{RecipePatch, StoredRecipe, PLACEHOLDER_IMAGE};
use greenfork_store::{RecipeStore, ScalarField, ScalarValue};

use crate::error::AuditError;

pub struct FixApplier {
    store: Arc<dyn RecipeStore>,
    /// Compute and log the would-be patch without writing.
    dry_run: bool,
}

impl FixApplier {
    pub fn new(store: Arc<dyn RecipeStore>, dry_run: bool) -> Self {
        Self { store, dry_run }
    }

    /// Apply a sparse patch to a stored recipe. Applying the same patch
    /// twice produces the same end state.
    pub async fn apply(
        &self,
        recipe: &StoredRecipe,
        patch: &RecipePatch,
    ) -> Result<(), AuditError> {
        if patch.is_empty() {
            return Ok(());
        }

        if self.dry_run {
            info!(
                slug = %recipe.slug,
                fields = ?patch.field_names(),
                "Dry run: patch computed, nothing written"
            );
            return Ok(());
        }

        let id = recipe.id;
        let r = &recipe.recipe;

        // Scalars. Guarded: an explicit clear of a healthy field is refused.
        if let Some(v) = &patch.description {
            self.set_text(id, recipe, ScalarField::Description, v, !r.description.is_empty())
                .await?;
        }
        if let Some(v) = &patch.prologue {
            self.set_text(id, recipe, ScalarField::Prologue, v, !r.prologue.is_empty())
                .await?;
        }
        if let Some(v) = &patch.tips {
            self.set_text(id, recipe, ScalarField::Tips, v, is_populated(&r.tips))
                .await?;
        }
        if let Some(v) = &patch.storage {
            self.set_text(id, recipe, ScalarField::Storage, v, is_populated(&r.storage))
                .await?;
        }
        if let Some(v) = &patch.ingredient_notes {
            self.set_text(
                id,
                recipe,
                ScalarField::IngredientNotes,
                v,
                is_populated(&r.ingredient_notes),
            )
            .await?;
        }
        if let Some(v) = &patch.image {
            let current_is_real = !recipe.image.trim().is_empty()
                && recipe.image != PLACEHOLDER_IMAGE
                && !recipe.image.starts_with("data:image");
            self.set_text(id, recipe, ScalarField::Image, v, current_is_real)
                .await?;
        }
        if let Some(n) = &patch.nutrition {
            self.store
                .update_scalar(id, ScalarField::Nutrition, ScalarValue::Nutrition(n.clone()))
                .await?;
        }

        // Collections: replace-all.
        if let Some(tags) = &patch.tags {
            self.store.replace_tags(id, tags).await?;
        }
        if let Some(faqs) = &patch.faqs {
            self.store.replace_faqs(id, faqs).await?;
        }
        if let Some(ingredients) = &patch.ingredients {
            self.store.replace_ingredients(id, ingredients).await?;
        }
        if let Some(instructions) = &patch.instructions {
            self.store.replace_instructions(id, instructions).await?;
        }

        info!(
            slug = %recipe.slug,
            fields = ?patch.field_names(),
            "Patch applied"
        );
        Ok(())
    }

    async fn set_text(
        &self,
        id: uuid::Uuid,
        recipe: &StoredRecipe,
        field: ScalarField,
        value: &str,
        current_is_populated: bool,
    ) -> Result<(), AuditError> {
        if value.trim().is_empty() && current_is_populated {
            warn!(
                slug = %recipe.slug,
                field = field.column(),
                "Refusing to clear a populated field with an empty value"
            );
            return Ok(());
        }
        self.store
            .update_scalar(id, field, ScalarValue::Text(value.to_string()))
            .await?;
        Ok(())
    }
}

fn is_populated(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
