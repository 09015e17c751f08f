//! LLM adapter: extracted page text → plant-based RecipeDraft.
//!
//! The substitution logic itself belongs to the model; this adapter only
//! enforces the request/response contract: one bounded prompt in, one JSON
//! object out, with a fenced-block fallback parse and neutral defaults for
//! anything the model left out.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use ai_client::util::{fenced_json, truncate_to_char_boundary};
use ai_client::{ModelTier, TextGenerate, TextRequest};
use greenfork_common::{Difficulty, Ingredient, InstructionStep, RecipeDraft};

use crate::error::TransformError;

/// Byte cap on the prompt body; the extractor already bounds its output but
/// the source URL and instructions ride along too.
const MAX_PROMPT_BYTES: usize = 60_000;

const SYSTEM_PROMPT: &str = r#"You are a recipe developer for a plant-based recipe website.

Given the text content of a recipe web page:
1. Identify the underlying recipe concept (dish, technique, flavor profile).
2. Write a COMPLETELY NEW plant-based version of it. All wording must be your
   own — never copy sentences from the source. Replace meat, dairy, eggs, and
   honey with plant-based ingredients that preserve the dish's character.
3. Return a single JSON object with exactly these fields:

{
  "title": "string — starts with 'Vegan' unless the dish is inherently plant-based",
  "description": "string — 1-2 sentences for a recipe card",
  "prologue": "string — 2-3 paragraph introduction",
  "prepTime": number (minutes),
  "cookTime": number (minutes),
  "totalTime": number (minutes),
  "servings": number,
  "difficulty": "easy" | "medium" | "hard",
  "categories": ["string"],
  "ingredients": [{"name": "string", "amount": "string, fractions as text like 1/2", "unit": "string or omit", "notes": "string or omit"}],
  "instructions": [{"step": number, "text": "string"}],
  "tags": ["string"],
  "tips": "string",
  "variations": "string",
  "storage": "string",
  "ingredientNotes": "string"
}

Respond with the JSON object only."#;

/// What the model returns. Every field defaults so a partial response still
/// yields a usable draft.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRecipe {
    title: String,
    description: String,
    prologue: String,
    prep_time: u32,
    cook_time: u32,
    total_time: u32,
    servings: u32,
    difficulty: String,
    categories: Vec<String>,
    ingredients: Vec<RawIngredient>,
    instructions: Vec<RawStep>,
    tags: Vec<String>,
    tips: Option<String>,
    variations: Option<String>,
    storage: Option<String>,
    ingredient_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIngredient {
    name: String,
    amount: String,
    unit: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStep {
    step: u32,
    text: String,
}

pub struct Transformer {
    generator: Arc<dyn TextGenerate>,
}

impl Transformer {
    pub fn new(generator: Arc<dyn TextGenerate>) -> Self {
        Self { generator }
    }

    /// Produce a plant-based draft from extracted page text.
    pub async fn veganize(
        &self,
        extracted_text: &str,
        source_url: &str,
    ) -> Result<RecipeDraft, TransformError> {
        let body = truncate_to_char_boundary(extracted_text, MAX_PROMPT_BYTES);
        let prompt = format!(
            "Create a plant-based version of the recipe on this page.\n\n\
             Source URL: {source_url}\n\n---\n\n{body}"
        );

        let request = TextRequest::new(ModelTier::Capable, SYSTEM_PROMPT, prompt)
            .temperature(0.7)
            .max_tokens(4096)
            .json();

        let response = self.generator.generate(&request).await?;
        debug!(bytes = response.len(), "Transform response received");

        let raw = parse_recipe_json(&response)?;
        Ok(normalize(raw, source_url))
    }
}

/// Strict JSON first, then a fenced ```json block; both failing is fatal to
/// this ingestion.
fn parse_recipe_json(response: &str) -> Result<RawRecipe, TransformError> {
    if let Ok(raw) = serde_json::from_str::<RawRecipe>(response) {
        return Ok(raw);
    }
    if let Some(block) = fenced_json(response) {
        if let Ok(raw) = serde_json::from_str::<RawRecipe>(block) {
            warn!("Strict JSON parse failed; recovered recipe from fenced block");
            return Ok(raw);
        }
    }
    Err(TransformError::Unparsable)
}

/// Fill neutral defaults and restore invariants the model may have dropped.
fn normalize(raw: RawRecipe, source_url: &str) -> RecipeDraft {
    let difficulty = match raw.difficulty.as_str() {
        "easy" => Difficulty::Easy,
        "hard" => Difficulty::Hard,
        _ => Difficulty::Medium,
    };

    // Model-supplied nonzero totals stand (source override); otherwise the
    // invariant total = prep + cook is restored.
    let total_time = if raw.total_time > 0 {
        raw.total_time
    } else {
        raw.prep_time + raw.cook_time
    };

    let instructions = raw
        .instructions
        .into_iter()
        .enumerate()
        .map(|(i, s)| InstructionStep {
            step: i as u32 + 1,
            text: s.text,
        })
        .collect();

    let ingredients = raw
        .ingredients
        .into_iter()
        .map(|i| Ingredient {
            name: i.name,
            amount: i.amount,
            unit: i.unit.filter(|u| !u.is_empty()),
            notes: i.notes.filter(|n| !n.is_empty()),
        })
        .collect();

    RecipeDraft {
        title: raw.title,
        description: raw.description,
        prologue: raw.prologue,
        prep_time: raw.prep_time,
        cook_time: raw.cook_time,
        total_time,
        servings: if raw.servings == 0 { 4 } else { raw.servings },
        difficulty,
        categories: raw.categories,
        ingredients,
        instructions,
        tags: raw.tags,
        tips: raw.tips.filter(|t| !t.is_empty()),
        variations: raw.variations.filter(|v| !v.is_empty()),
        storage: raw.storage.filter(|s| !s.is_empty()),
        ingredient_notes: raw.ingredient_notes.filter(|n| !n.is_empty()),
        original_url: source_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedGenerator(String);

    #[async_trait]
    impl TextGenerate for CannedGenerator {
        async fn generate(&self, _request: &TextRequest) -> Result<String, ai_client::AiError> {
            Ok(self.0.clone())
        }
    }

    fn transformer(response: &str) -> Transformer {
        Transformer::new(Arc::new(CannedGenerator(response.to_string())))
    }

    #[tokio::test]
    async fn parses_strict_json() {
        let t = transformer(
            r#"{"title":"Vegan Beef Stew","description":"Hearty stew.","prepTime":20,"cookTime":40,"servings":6,"difficulty":"easy","ingredients":[{"name":"seitan","amount":"1/2","unit":"lb"}],"instructions":[{"step":1,"text":"Brown the seitan."}]}"#,
        );
        let draft = t.veganize("some page text", "https://example.com/stew").await.unwrap();
        assert_eq!(draft.title, "Vegan Beef Stew");
        assert_eq!(draft.total_time, 60);
        assert_eq!(draft.servings, 6);
        assert_eq!(draft.difficulty, Difficulty::Easy);
        assert_eq!(draft.ingredients[0].amount, "1/2");
        assert_eq!(draft.original_url, "https://example.com/stew");
    }

    #[tokio::test]
    async fn recovers_from_fenced_block() {
        let t = transformer(
            "Here is your recipe:\n```json\n{\"title\":\"Vegan Chili\"}\n```\nEnjoy!",
        );
        let draft = t.veganize("text", "https://example.com").await.unwrap();
        assert_eq!(draft.title, "Vegan Chili");
    }

    #[tokio::test]
    async fn unparsable_response_is_typed_error() {
        let t = transformer("I could not find a recipe on that page, sorry.");
        let err = t.veganize("text", "https://example.com").await.unwrap_err();
        assert!(matches!(err, TransformError::Unparsable));
    }

    #[tokio::test]
    async fn missing_fields_get_neutral_defaults() {
        let t = transformer(r#"{"title":"Vegan Toast"}"#);
        let draft = t.veganize("text", "https://example.com").await.unwrap();
        assert_eq!(draft.servings, 4);
        assert_eq!(draft.difficulty, Difficulty::Medium);
        assert_eq!(draft.prep_time, 0);
        assert_eq!(draft.total_time, 0);
        assert!(draft.ingredients.is_empty());
        assert!(draft.tags.is_empty());
        assert!(draft.tips.is_none());
    }

    #[tokio::test]
    async fn steps_are_renumbered_contiguously() {
        let t = transformer(
            r#"{"title":"Vegan Soup","instructions":[{"step":3,"text":"Chop."},{"step":9,"text":"Simmer."}]}"#,
        );
        let draft = t.veganize("text", "https://example.com").await.unwrap();
        let steps: Vec<u32> = draft.instructions.iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![1, 2]);
    }

    #[tokio::test]
    async fn explicit_total_time_overrides_sum() {
        let t = transformer(
            r#"{"title":"Vegan Brisket","prepTime":30,"cookTime":60,"totalTime":480}"#,
        );
        let draft = t.veganize("text", "https://example.com").await.unwrap();
        assert_eq!(draft.total_time, 480);
    }
}
