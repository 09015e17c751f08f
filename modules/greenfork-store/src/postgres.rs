// Postgres persistence for recipe records and their child collections.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use greenfork_common::{
    Difficulty, Faq, Ingredient, InstructionStep, Nutrition, RecipeDraft, StoredRecipe,
};

use crate::error::Result;
use crate::{RecipeStore, ScalarField, ScalarValue, TitleMatch};

pub struct PgRecipeStore {
    pool: PgPool,
}

/// A row from the recipes table; child collections load separately.
#[derive(Debug, sqlx::FromRow)]
struct RecipeRow {
    id: Uuid,
    slug: String,
    title: String,
    description: String,
    prologue: String,
    prep_time: i32,
    cook_time: i32,
    total_time: i32,
    servings: i32,
    difficulty: String,
    tips: Option<String>,
    variations: Option<String>,
    storage: Option<String>,
    ingredient_notes: Option<String>,
    original_url: String,
    image: String,
    nutrition: Option<serde_json::Value>,
    date_published: DateTime<Utc>,
}

impl PgRecipeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn assemble(&self, row: RecipeRow) -> Result<StoredRecipe> {
        let ingredients = sqlx::query_as::<_, (String, String, Option<String>, Option<String>)>(
            r#"
            SELECT name, amount, unit, notes FROM recipe_ingredients
            WHERE recipe_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(name, amount, unit, notes)| Ingredient {
            name,
            amount,
            unit,
            notes,
        })
        .collect();

        let instructions = sqlx::query_as::<_, (i32, String)>(
            r#"
            SELECT step, text FROM recipe_instructions
            WHERE recipe_id = $1
            ORDER BY step ASC
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(step, text)| InstructionStep {
            step: step as u32,
            text,
        })
        .collect();

        let tags = sqlx::query_scalar::<_, String>(
            "SELECT tag FROM recipe_tags WHERE recipe_id = $1 ORDER BY tag ASC",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        let categories = sqlx::query_scalar::<_, String>(
            "SELECT category FROM recipe_categories WHERE recipe_id = $1 ORDER BY category ASC",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        let faqs = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT question, answer FROM recipe_faqs
            WHERE recipe_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(question, answer)| Faq { question, answer })
        .collect();

        let difficulty = match row.difficulty.as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        };

        let nutrition: Option<Nutrition> = row
            .nutrition
            .and_then(|v| serde_json::from_value(v).ok());

        Ok(StoredRecipe {
            id: row.id,
            slug: row.slug,
            recipe: RecipeDraft {
                title: row.title,
                description: row.description,
                prologue: row.prologue,
                prep_time: row.prep_time as u32,
                cook_time: row.cook_time as u32,
                total_time: row.total_time as u32,
                servings: row.servings as u32,
                difficulty,
                categories,
                ingredients,
                instructions,
                tags,
                tips: row.tips,
                variations: row.variations,
                storage: row.storage,
                ingredient_notes: row.ingredient_notes,
                original_url: row.original_url,
            },
            date_published: row.date_published,
            image: row.image,
            nutrition,
            faqs,
        })
    }
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn create(&self, recipe: &StoredRecipe) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let r = &recipe.recipe;

        sqlx::query(
            r#"
            INSERT INTO recipes
                (id, slug, title, description, prologue, prep_time, cook_time,
                 total_time, servings, difficulty, tips, variations, storage,
                 ingredient_notes, original_url, image, nutrition, date_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18)
            "#,
        )
        .bind(recipe.id)
        .bind(&recipe.slug)
        .bind(&r.title)
        .bind(&r.description)
        .bind(&r.prologue)
        .bind(r.prep_time as i32)
        .bind(r.cook_time as i32)
        .bind(r.total_time as i32)
        .bind(r.servings as i32)
        .bind(r.difficulty.to_string())
        .bind(&r.tips)
        .bind(&r.variations)
        .bind(&r.storage)
        .bind(&r.ingredient_notes)
        .bind(&r.original_url)
        .bind(&recipe.image)
        .bind(
            recipe
                .nutrition
                .as_ref()
                .map(|n| serde_json::to_value(n).unwrap_or_default()),
        )
        .bind(recipe.date_published)
        .execute(&mut *tx)
        .await?;

        for (i, ing) in r.ingredients.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO recipe_ingredients (recipe_id, position, name, amount, unit, notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(recipe.id)
            .bind(i as i32)
            .bind(&ing.name)
            .bind(&ing.amount)
            .bind(&ing.unit)
            .bind(&ing.notes)
            .execute(&mut *tx)
            .await?;
        }

        for step in &r.instructions {
            sqlx::query(
                "INSERT INTO recipe_instructions (recipe_id, step, text) VALUES ($1, $2, $3)",
            )
            .bind(recipe.id)
            .bind(step.step as i32)
            .bind(&step.text)
            .execute(&mut *tx)
            .await?;
        }

        for tag in &r.tags {
            sqlx::query("INSERT INTO recipe_tags (recipe_id, tag) VALUES ($1, $2)")
                .bind(recipe.id)
                .bind(tag)
                .execute(&mut *tx)
                .await?;
        }

        for category in &r.categories {
            sqlx::query("INSERT INTO recipe_categories (recipe_id, category) VALUES ($1, $2)")
                .bind(recipe.id)
                .bind(category)
                .execute(&mut *tx)
                .await?;
        }

        for (i, faq) in recipe.faqs.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO recipe_faqs (recipe_id, position, question, answer)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(recipe.id)
            .bind(i as i32)
            .bind(&faq.question)
            .bind(&faq.answer)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn fetch_by_id(&self, id: Uuid) -> Result<Option<StoredRecipe>> {
        let row = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<StoredRecipe>> {
        let row = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM recipes WHERE slug = $1)",
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn find_title_exact(&self, normalized_title: &str) -> Result<Option<TitleMatch>> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT title, slug FROM recipes WHERE LOWER(title) = $1 LIMIT 1",
        )
        .bind(normalized_title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(title, slug)| TitleMatch { title, slug }))
    }

    async fn find_titles_with_token(&self, token: &str) -> Result<Vec<TitleMatch>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT title, slug FROM recipes WHERE LOWER(title) LIKE '%' || $1 || '%'",
        )
        .bind(token.to_lowercase())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(title, slug)| TitleMatch { title, slug })
            .collect())
    }

    async fn list(&self, limit: Option<u32>) -> Result<Vec<StoredRecipe>> {
        let rows = match limit {
            Some(n) => {
                sqlx::query_as::<_, RecipeRow>(
                    "SELECT * FROM recipes ORDER BY date_published ASC LIMIT $1",
                )
                .bind(n as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes ORDER BY date_published ASC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut recipes = Vec::with_capacity(rows.len());
        for row in rows {
            recipes.push(self.assemble(row).await?);
        }
        Ok(recipes)
    }

    async fn update_scalar(
        &self,
        id: Uuid,
        field: ScalarField,
        value: ScalarValue,
    ) -> Result<()> {
        // field.column() is a closed enum, never caller input.
        let sql = format!("UPDATE recipes SET {} = $1 WHERE id = $2", field.column());
        let query = match value {
            ScalarValue::Text(text) => sqlx::query(&sql).bind(text).bind(id),
            ScalarValue::Nutrition(n) => sqlx::query(&sql)
                .bind(serde_json::to_value(&n).unwrap_or_default())
                .bind(id),
        };
        query.execute(&self.pool).await?;
        Ok(())
    }

    async fn replace_tags(&self, id: Uuid, tags: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for tag in tags {
            sqlx::query("INSERT INTO recipe_tags (recipe_id, tag) VALUES ($1, $2)")
                .bind(id)
                .bind(tag)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn replace_faqs(&self, id: Uuid, faqs: &[Faq]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM recipe_faqs WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for (i, faq) in faqs.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO recipe_faqs (recipe_id, position, question, answer)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id)
            .bind(i as i32)
            .bind(&faq.question)
            .bind(&faq.answer)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn replace_ingredients(&self, id: Uuid, ingredients: &[Ingredient]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for (i, ing) in ingredients.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO recipe_ingredients (recipe_id, position, name, amount, unit, notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(id)
            .bind(i as i32)
            .bind(&ing.name)
            .bind(&ing.amount)
            .bind(&ing.unit)
            .bind(&ing.notes)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn replace_instructions(
        &self,
        id: Uuid,
        instructions: &[InstructionStep],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM recipe_instructions WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for step in instructions {
            sqlx::query(
                "INSERT INTO recipe_instructions (recipe_id, step, text) VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(step.step as i32)
            .bind(&step.text)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
