//! Shared domain model and helpers for the Greenfork recipe pipeline.

pub mod cache;
pub mod config;
pub mod similarity;
pub mod slug;
pub mod types;

pub use cache::TtlCache;
pub use config::Config;
pub use similarity::{jaccard_similarity, normalize_title, significant_tokens};
pub use slug::slugify;
pub use types::{
    Difficulty, Faq, Ingredient, InstructionStep, IssueReport, Nutrition, RecipeDraft,
    RecipePatch, StoredRecipe, PLACEHOLDER_IMAGE,
};
