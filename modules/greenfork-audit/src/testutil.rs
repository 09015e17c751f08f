//! Shared fixtures for the audit-path tests.

use chrono::Utc;
use uuid::Uuid;

use greenfork_common::{
    Difficulty, Faq, Ingredient, InstructionStep, Nutrition, RecipeDraft, StoredRecipe,
};

/// A fully-populated recipe the auditor finds nothing wrong with.
pub(crate) fn healthy_recipe() -> StoredRecipe {
    StoredRecipe {
        id: Uuid::from_u128(7),
        slug: "vegan-mushroom-bourguignon".to_string(),
        recipe: RecipeDraft {
            title: "Vegan Mushroom Bourguignon".to_string(),
            description: "Deeply savory mushrooms braised in red wine with pearl onions."
                .to_string(),
            prologue: "This is the stew for the first properly cold weekend of the year: \
                       a pot of mushrooms and pearl onions simmered slowly in red wine \
                       until the sauce turns glossy and rich."
                .to_string(),
            prep_time: 25,
            cook_time: 50,
            total_time: 75,
            servings: 6,
            difficulty: Difficulty::Medium,
            categories: vec!["dinner".to_string(), "french".to_string()],
            ingredients: vec![
                Ingredient {
                    name: "cremini mushrooms".to_string(),
                    amount: "2".to_string(),
                    unit: Some("lbs".to_string()),
                    notes: Some("halved".to_string()),
                },
                Ingredient {
                    name: "pearl onions".to_string(),
                    amount: "1".to_string(),
                    unit: Some("cup".to_string()),
                    notes: None,
                },
                Ingredient {
                    name: "dry red wine".to_string(),
                    amount: "1 1/2".to_string(),
                    unit: Some("cups".to_string()),
                    notes: None,
                },
            ],
            instructions: vec![
                InstructionStep {
                    step: 1,
                    text: "Sear the mushrooms in batches until browned.".to_string(),
                },
                InstructionStep {
                    step: 2,
                    text: "Deglaze with wine, add onions, simmer 45 minutes.".to_string(),
                },
            ],
            tags: vec![
                "stew".to_string(),
                "french".to_string(),
                "mushrooms".to_string(),
                "comfort-food".to_string(),
                "winter".to_string(),
            ],
            tips: Some("Sear in batches so the mushrooms brown instead of steaming.".to_string()),
            variations: Some("Swap cremini for portobello caps.".to_string()),
            storage: Some("Keeps 4 days refrigerated; the flavor improves overnight.".to_string()),
            ingredient_notes: Some(
                "Any dry red works; avoid anything labeled 'cooking wine'.".to_string(),
            ),
            original_url: "https://example.com/beef-bourguignon".to_string(),
        },
        date_published: Utc::now(),
        image: "/images/recipes/vegan-mushroom-bourguignon.png".to_string(),
        nutrition: Some(Nutrition {
            calories: 320,
            protein: "11g".to_string(),
            carbs: "28g".to_string(),
            fat: "14g".to_string(),
        }),
        faqs: vec![Faq {
            question: "Can I make this without wine?".to_string(),
            answer: "Yes — use extra broth plus a tablespoon of balsamic vinegar.".to_string(),
        }],
    }
}

/// A freshly-ingested record with nothing filled in beyond the draft basics.
pub(crate) fn sparse_recipe() -> StoredRecipe {
    let mut recipe = healthy_recipe();
    recipe.id = Uuid::from_u128(8);
    recipe.slug = "vegan-beef-stew".to_string();
    recipe.recipe.title = "Vegan Beef Stew".to_string();
    recipe.recipe.description = "A stew.".to_string();
    recipe.recipe.prologue = "Short intro.".to_string();
    recipe.recipe.tags = vec!["stew".to_string()];
    recipe.recipe.tips = None;
    recipe.recipe.storage = None;
    recipe.recipe.ingredient_notes = None;
    recipe.image = String::new();
    recipe.nutrition = None;
    recipe.faqs = vec![];
    recipe
}
