//! Repair planning: a minimal, cost-tiered AI request asking only for the
//! fields an audit flagged as broken.
//!
//! The tier rule is hard, not heuristic: the capable model runs only when a
//! verbiage issue flags description or prologue (a rewriting task). Every
//! other fix uses the fast model.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use ai_client::util::fenced_json;
use ai_client::{ModelTier, TextGenerate, TextRequest};
use greenfork_common::{Faq, IssueReport, Nutrition, RecipePatch, StoredRecipe};

use crate::auditor::{
    ISSUE_DESCRIPTION_SHORT, ISSUE_MISSING_INGREDIENT_NOTES, ISSUE_MISSING_STORAGE,
    ISSUE_MISSING_TIPS, ISSUE_PROLOGUE_SHORT,
};
use crate::error::AuditError;

const REPAIR_SYSTEM_PROMPT: &str = r#"You repair recipe records for a plant-based recipe website.

You will be given one recipe and a list of fields to produce. Respond with a
single JSON object containing ONLY the requested keys — no commentary, no
extra keys. All content must fit the recipe you are given and be fully
plant-based."#;

/// Fields the text-model repair path can produce. Images go through the
/// image resolver instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairField {
    Description,
    Prologue,
    Tips,
    Storage,
    IngredientNotes,
    Nutrition,
    Faqs,
    Tags,
}

impl RepairField {
    /// JSON key in the model request/response.
    pub fn key(self) -> &'static str {
        match self {
            RepairField::Description => "description",
            RepairField::Prologue => "prologue",
            RepairField::Tips => "tips",
            RepairField::Storage => "storage",
            RepairField::IngredientNotes => "ingredientNotes",
            RepairField::Nutrition => "nutrition",
            RepairField::Faqs => "faqs",
            RepairField::Tags => "tags",
        }
    }

    fn shape(self) -> &'static str {
        match self {
            RepairField::Description => {
                "\"description\": a 1-2 sentence recipe-card description (string)"
            }
            RepairField::Prologue => {
                "\"prologue\": a 2-3 paragraph introduction (string)"
            }
            RepairField::Tips => "\"tips\": practical cooking tips (string)",
            RepairField::Storage => "\"storage\": storage and reheating guidance (string)",
            RepairField::IngredientNotes => {
                "\"ingredientNotes\": notes on sourcing or substituting ingredients (string)"
            }
            RepairField::Nutrition => {
                "\"nutrition\": {\"calories\": number, \"protein\": \"12g\", \"carbs\": \"40g\", \"fat\": \"9g\"} per serving"
            }
            RepairField::Faqs => {
                "\"faqs\": [{\"question\": \"...\", \"answer\": \"...\"}] — 3 to 5 entries"
            }
            RepairField::Tags => "\"tags\": [\"string\"] — 5 to 8 lowercase tags",
        }
    }
}

/// A planned repair request: which fields, at which tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairPlan {
    pub fields: Vec<RepairField>,
    pub tier: ModelTier,
}

/// Map an issue report to the minimal set of repairable fields. Returns None
/// when nothing the text path covers is broken.
pub fn build_plan(report: &IssueReport, skip_nutrition: bool) -> Option<RepairPlan> {
    let mut fields = Vec::new();

    for issue in &report.verbiage_issues {
        match issue.as_str() {
            ISSUE_DESCRIPTION_SHORT => fields.push(RepairField::Description),
            ISSUE_PROLOGUE_SHORT => fields.push(RepairField::Prologue),
            _ => {}
        }
    }
    for issue in &report.seo_issues {
        match issue.as_str() {
            ISSUE_MISSING_TIPS => fields.push(RepairField::Tips),
            ISSUE_MISSING_STORAGE => fields.push(RepairField::Storage),
            ISSUE_MISSING_INGREDIENT_NOTES => fields.push(RepairField::IngredientNotes),
            _ => {}
        }
    }
    if report.missing_nutrition && !skip_nutrition {
        fields.push(RepairField::Nutrition);
    }
    if report.missing_faqs {
        fields.push(RepairField::Faqs);
    }
    if report.missing_tags {
        fields.push(RepairField::Tags);
    }

    if fields.is_empty() {
        return None;
    }

    // Rewriting description/prologue is the one task worth the expensive
    // model; mechanical fills stay on the fast tier.
    let needs_rewrite = fields
        .iter()
        .any(|f| matches!(f, RepairField::Description | RepairField::Prologue));
    let tier = if needs_rewrite {
        ModelTier::Capable
    } else {
        ModelTier::Fast
    };

    Some(RepairPlan { fields, tier })
}

pub struct RepairPlanner {
    generator: Arc<dyn TextGenerate>,
}

impl RepairPlanner {
    pub fn new(generator: Arc<dyn TextGenerate>) -> Self {
        Self { generator }
    }

    /// Plan and execute one repair request. `Ok(None)` means no text-path
    /// fields were broken.
    pub async fn repair(
        &self,
        recipe: &StoredRecipe,
        report: &IssueReport,
        skip_nutrition: bool,
    ) -> Result<Option<RecipePatch>, AuditError> {
        let Some(plan) = build_plan(report, skip_nutrition) else {
            return Ok(None);
        };

        debug!(
            slug = %recipe.slug,
            fields = ?plan.fields,
            tier = ?plan.tier,
            "Repair request planned"
        );

        let request = TextRequest::new(plan.tier, REPAIR_SYSTEM_PROMPT, build_prompt(recipe, &plan))
            .temperature(0.5)
            .max_tokens(2048)
            .json();

        let response = self.generator.generate(&request).await?;
        let patch = parse_patch(&response, &plan.fields)?;
        Ok(Some(patch))
    }
}

fn build_prompt(recipe: &StoredRecipe, plan: &RepairPlan) -> String {
    let r = &recipe.recipe;
    let ingredients = r
        .ingredients
        .iter()
        .map(|i| i.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let shapes = plan
        .fields
        .iter()
        .map(|f| format!("- {}", f.shape()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Recipe: {title}\n\
         Description: {description}\n\
         Servings: {servings}\n\
         Ingredients: {ingredients}\n\n\
         Produce the following fields:\n{shapes}\n\n\
         Return a JSON object with exactly those keys.",
        title = r.title,
        description = r.description,
        servings = r.servings,
    )
}

/// Validate a repair response against the requested fields.
///
/// Absent keys (or JSON null) leave the field untouched; they are not the
/// same as an explicit clear. A present key of the wrong type rejects the
/// whole patch.
fn parse_patch(response: &str, requested: &[RepairField]) -> Result<RecipePatch, AuditError> {
    let value = parse_object(response)?;
    let object = value
        .as_object()
        .ok_or_else(|| AuditError::PatchParse("response is not a JSON object".to_string()))?;

    let mut patch = RecipePatch::default();
    for field in requested {
        let Some(v) = object.get(field.key()) else {
            continue;
        };
        if v.is_null() {
            continue;
        }
        match field {
            RepairField::Description => patch.description = Some(string_field(v, field.key())?),
            RepairField::Prologue => patch.prologue = Some(string_field(v, field.key())?),
            RepairField::Tips => patch.tips = Some(string_field(v, field.key())?),
            RepairField::Storage => patch.storage = Some(string_field(v, field.key())?),
            RepairField::IngredientNotes => {
                patch.ingredient_notes = Some(string_field(v, field.key())?)
            }
            RepairField::Nutrition => {
                let nutrition: Nutrition = typed_field(v, field.key())?;
                patch.nutrition = Some(nutrition);
            }
            RepairField::Faqs => {
                let faqs: Vec<Faq> = typed_field(v, field.key())?;
                patch.faqs = Some(faqs);
            }
            RepairField::Tags => {
                let tags: Vec<String> = typed_field(v, field.key())?;
                patch.tags = Some(tags);
            }
        }
    }
    Ok(patch)
}

fn parse_object(response: &str) -> Result<Value, AuditError> {
    if let Ok(value) = serde_json::from_str(response) {
        return Ok(value);
    }
    if let Some(block) = fenced_json(response) {
        if let Ok(value) = serde_json::from_str(block) {
            warn!("Strict JSON parse failed; recovered patch from fenced block");
            return Ok(value);
        }
    }
    Err(AuditError::PatchParse("not valid JSON".to_string()))
}

fn string_field(v: &Value, key: &str) -> Result<String, AuditError> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| AuditError::PatchParse(format!("field '{key}' has the wrong type")))
}

fn typed_field<T: serde::de::DeserializeOwned>(v: &Value, key: &str) -> Result<T, AuditError> {
    serde_json::from_value(v.clone())
        .map_err(|_| AuditError::PatchParse(format!("field '{key}' has the wrong type")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auditor::audit;
    use crate::testutil::{healthy_recipe, sparse_recipe};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[test]
    fn healthy_report_plans_nothing() {
        let report = audit(&healthy_recipe());
        assert!(build_plan(&report, false).is_none());
    }

    #[test]
    fn mechanical_fixes_use_fast_tier() {
        let mut report = IssueReport::default();
        report.missing_faqs = true;
        report.missing_tags = true;
        report.seo_issues = vec![ISSUE_MISSING_TIPS.to_string()];

        let plan = build_plan(&report, false).unwrap();
        assert_eq!(plan.tier, ModelTier::Fast);
        assert_eq!(
            plan.fields,
            vec![RepairField::Tips, RepairField::Faqs, RepairField::Tags]
        );
    }

    #[test]
    fn verbiage_issue_escalates_to_capable_tier() {
        let mut report = IssueReport::default();
        report.verbiage_issues = vec![ISSUE_DESCRIPTION_SHORT.to_string()];
        report.missing_tags = true;

        let plan = build_plan(&report, false).unwrap();
        assert_eq!(plan.tier, ModelTier::Capable);
    }

    #[test]
    fn healthy_fields_are_never_requested() {
        let mut report = IssueReport::default();
        report.missing_faqs = true;

        let plan = build_plan(&report, false).unwrap();
        assert_eq!(plan.fields, vec![RepairField::Faqs]);
    }

    #[test]
    fn skip_nutrition_drops_the_field() {
        let mut report = IssueReport::default();
        report.missing_nutrition = true;
        report.missing_tags = true;

        let plan = build_plan(&report, true).unwrap();
        assert!(!plan.fields.contains(&RepairField::Nutrition));
        assert!(plan.fields.contains(&RepairField::Tags));
    }

    #[test]
    fn nutrition_alone_with_skip_plans_nothing() {
        let mut report = IssueReport::default();
        report.missing_nutrition = true;
        assert!(build_plan(&report, true).is_none());
    }

    #[test]
    fn subset_response_is_accepted() {
        let requested = [RepairField::Tags, RepairField::Faqs];
        let patch = parse_patch(r#"{"tags": ["stew", "winter"]}"#, &requested).unwrap();
        assert_eq!(
            patch.tags,
            Some(vec!["stew".to_string(), "winter".to_string()])
        );
        // faqs absent from the response → untouched, not cleared.
        assert!(patch.faqs.is_none());
    }

    #[test]
    fn unrequested_keys_are_ignored() {
        let requested = [RepairField::Tags];
        let patch = parse_patch(
            r#"{"tags": ["stew"], "description": "sneaky rewrite"}"#,
            &requested,
        )
        .unwrap();
        assert!(patch.description.is_none());
    }

    #[test]
    fn wrong_type_rejects_the_whole_patch() {
        let requested = [RepairField::Tags, RepairField::Tips];
        let err = parse_patch(
            r#"{"tips": "Use a heavy pot.", "tags": "stew, winter"}"#,
            &requested,
        )
        .unwrap_err();
        assert!(matches!(err, AuditError::PatchParse(_)));
    }

    #[test]
    fn null_field_is_left_untouched() {
        let requested = [RepairField::Tips];
        let patch = parse_patch(r#"{"tips": null}"#, &requested).unwrap();
        assert!(patch.tips.is_none());
    }

    #[test]
    fn fenced_response_is_recovered() {
        let requested = [RepairField::Tags];
        let patch = parse_patch("```json\n{\"tags\": [\"stew\"]}\n```", &requested).unwrap();
        assert_eq!(patch.tags, Some(vec!["stew".to_string()]));
    }

    #[test]
    fn prose_response_is_rejected() {
        let requested = [RepairField::Tags];
        let err = parse_patch("Sorry, I cannot help with that.", &requested).unwrap_err();
        assert!(matches!(err, AuditError::PatchParse(_)));
    }

    /// Records the tier of each request it serves.
    struct TierRecorder {
        tiers: Mutex<Vec<ModelTier>>,
        response: String,
    }

    #[async_trait]
    impl TextGenerate for TierRecorder {
        async fn generate(&self, request: &TextRequest) -> Result<String, ai_client::AiError> {
            self.tiers.lock().unwrap().push(request.tier);
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn repair_sends_planned_tier_and_parses_patch() {
        let recorder = Arc::new(TierRecorder {
            tiers: Mutex::new(Vec::new()),
            response: r#"{"tags": ["stew", "winter", "hearty", "one-pot", "seitan"], "faqs": [{"question": "Q", "answer": "A"}], "tips": "Sear well.", "storage": "Keeps 4 days.", "ingredientNotes": "Any seitan works.", "nutrition": {"calories": 300, "protein": "14g", "carbs": "30g", "fat": "10g"}, "description": "A hearty stew worth making twice.", "prologue": "Long, cozy introduction that rambles about winter evenings and the smell of a simmering pot filling the kitchen."}"#
                .to_string(),
        });
        let planner = RepairPlanner::new(recorder.clone());

        let recipe = sparse_recipe();
        let report = audit(&recipe);
        let patch = planner.repair(&recipe, &report, false).await.unwrap().unwrap();

        // Verbiage issues present → the capable tier was used.
        assert_eq!(recorder.tiers.lock().unwrap().as_slice(), &[ModelTier::Capable]);
        assert!(patch.description.is_some());
        assert!(patch.tags.is_some());
        assert!(patch.nutrition.is_some());
        // Image is not a text-path field.
        assert!(patch.image.is_none());
    }

    #[tokio::test]
    async fn repair_on_clean_report_is_a_noop() {
        let recorder = Arc::new(TierRecorder {
            tiers: Mutex::new(Vec::new()),
            response: "{}".to_string(),
        });
        let planner = RepairPlanner::new(recorder.clone());

        let recipe = healthy_recipe();
        let report = audit(&recipe);
        let result = planner.repair(&recipe, &report, false).await.unwrap();

        assert!(result.is_none());
        assert!(recorder.tiers.lock().unwrap().is_empty());
    }
}
