use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shared hero-image placeholder. Recipes fall back to this when image
/// generation is unavailable; the auditor treats it as "no image".
pub const PLACEHOLDER_IMAGE: &str = "/images/recipes/placeholder.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    /// Amount as written in the source; fractions like "1/2" survive as text.
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionStep {
    /// 1-based, contiguous.
    pub step: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: u32,
    /// Per-serving amounts as display strings ("12g").
    pub protein: String,
    pub carbs: String,
    pub fat: String,
}

/// Transient recipe produced by the transformer. Created and discarded
/// within one ingestion request; never stored as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub prologue: String,
    pub prep_time: u32,
    pub cook_time: u32,
    pub total_time: u32,
    pub servings: u32,
    pub difficulty: Difficulty,
    pub categories: Vec<String>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<InstructionStep>,
    pub tags: Vec<String>,
    pub tips: Option<String>,
    pub variations: Option<String>,
    pub storage: Option<String>,
    pub ingredient_notes: Option<String>,
    /// Provenance: the page this recipe was derived from.
    pub original_url: String,
}

/// Persisted recipe. Created exactly once by the persister; after that only
/// the fix applier writes, and only fields flagged broken by an audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecipe {
    pub id: Uuid,
    /// Unique, derived from the title, immutable once assigned.
    pub slug: String,
    pub recipe: RecipeDraft,
    /// Set once, at creation.
    pub date_published: DateTime<Utc>,
    /// Path or URL; may be the shared placeholder.
    pub image: String,
    pub nutrition: Option<Nutrition>,
    pub faqs: Vec<Faq>,
}

/// Sparse repair payload. `None` means "leave this field alone", which is
/// not the same as an explicit clear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipePatch {
    pub description: Option<String>,
    pub prologue: Option<String>,
    pub tips: Option<String>,
    pub storage: Option<String>,
    pub ingredient_notes: Option<String>,
    pub image: Option<String>,
    pub nutrition: Option<Nutrition>,
    pub tags: Option<Vec<String>>,
    pub faqs: Option<Vec<Faq>>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub instructions: Option<Vec<InstructionStep>>,
}

impl RecipePatch {
    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }

    /// Names of the fields this patch touches, for logging.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.description.is_some() {
            fields.push("description");
        }
        if self.prologue.is_some() {
            fields.push("prologue");
        }
        if self.tips.is_some() {
            fields.push("tips");
        }
        if self.storage.is_some() {
            fields.push("storage");
        }
        if self.ingredient_notes.is_some() {
            fields.push("ingredient_notes");
        }
        if self.image.is_some() {
            fields.push("image");
        }
        if self.nutrition.is_some() {
            fields.push("nutrition");
        }
        if self.tags.is_some() {
            fields.push("tags");
        }
        if self.faqs.is_some() {
            fields.push("faqs");
        }
        if self.ingredients.is_some() {
            fields.push("ingredients");
        }
        if self.instructions.is_some() {
            fields.push("instructions");
        }
        fields
    }
}

/// Audit classification for one stored recipe. Recomputed on every audit
/// pass; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReport {
    pub missing_image: bool,
    pub missing_nutrition: bool,
    pub missing_faqs: bool,
    pub missing_tags: bool,
    pub verbiage_issues: Vec<String>,
    pub seo_issues: Vec<String>,
}

impl IssueReport {
    pub fn has_issues(&self) -> bool {
        self.missing_image
            || self.missing_nutrition
            || self.missing_faqs
            || self.missing_tags
            || !self.verbiage_issues.is_empty()
            || !self.seo_issues.is_empty()
    }
}
