//! Pure corpus classifier. No external calls, no hidden state; cheap enough
//! to run over the whole corpus before any AI budget is spent.

use greenfork_common::{IssueReport, StoredRecipe, PLACEHOLDER_IMAGE};

pub const MIN_DESCRIPTION_CHARS: usize = 30;
pub const MIN_PROLOGUE_CHARS: usize = 80;
pub const MIN_TAGS: usize = 5;

pub const ISSUE_DESCRIPTION_SHORT: &str = "Description too short";
pub const ISSUE_PROLOGUE_SHORT: &str = "Prologue too short";
pub const ISSUE_MISSING_INGREDIENT_NOTES: &str = "Missing ingredient notes";
pub const ISSUE_MISSING_TIPS: &str = "Missing tips";
pub const ISSUE_MISSING_STORAGE: &str = "Missing storage";

/// Classify one stored recipe against the issue taxonomy.
pub fn audit(recipe: &StoredRecipe) -> IssueReport {
    let r = &recipe.recipe;

    let image = recipe.image.trim();
    let missing_image =
        image.is_empty() || image == PLACEHOLDER_IMAGE || image.starts_with("data:image");

    let missing_nutrition = match &recipe.nutrition {
        None => true,
        Some(n) => n.calories == 0 || n.protein.trim().is_empty() || n.protein.trim() == "0g",
    };

    let missing_faqs = recipe.faqs.is_empty();
    let missing_tags = r.tags.len() < MIN_TAGS;

    let mut verbiage_issues = Vec::new();
    if r.description.chars().count() < MIN_DESCRIPTION_CHARS {
        verbiage_issues.push(ISSUE_DESCRIPTION_SHORT.to_string());
    }
    if r.prologue.chars().count() < MIN_PROLOGUE_CHARS {
        verbiage_issues.push(ISSUE_PROLOGUE_SHORT.to_string());
    }

    let mut seo_issues = Vec::new();
    if !r.ingredients.is_empty() && r.ingredient_notes.is_none() {
        seo_issues.push(ISSUE_MISSING_INGREDIENT_NOTES.to_string());
    }
    if r.tips.as_deref().is_none_or(|t| t.trim().is_empty()) {
        seo_issues.push(ISSUE_MISSING_TIPS.to_string());
    }
    if r.storage.is_none() {
        seo_issues.push(ISSUE_MISSING_STORAGE.to_string());
    }

    IssueReport {
        missing_image,
        missing_nutrition,
        missing_faqs,
        missing_tags,
        verbiage_issues,
        seo_issues,
    }
}
