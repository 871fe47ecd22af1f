//! Generation capabilities backed by the completion engine.

use crate::context::CapabilityContext;
use crate::tool::Capability;
use async_trait::async_trait;
use serde_json::{Value, json};
use thali_prefs::PreferenceRecord;
use thali_protocol::{
    ChatMessage, CompletionOutcome, CompletionRequest, SideEffect, ToolError, retrying,
};

const RECOMMENDATION_INSTRUCTIONS: &str = "\
You are a food recommendation assistant for Indian users. Your goal is to \
eliminate decision fatigue by providing simple, nutritious meal suggestions.\n\
Based on the user's food preferences and message, provide exactly 3 food \
recommendations that are:\n\
1. EASY TO MAKE: simple recipes or easy to order\n\
2. NUTRITIONALLY BALANCED: a good mix of carbs, protein, and vegetables\n\
3. PRACTICAL: can be made at home or ordered easily in India\n\
4. POPULAR: common in Indian households, traditional or modern\n\
Format each as a numbered line with the meal name in bold and a brief reason \
in at most six words. Keep the response crisp and minimal.";

const RECIPE_INSTRUCTIONS: &str = "\
You are a recipe expert for Indian users. Generate a concise recipe for the \
requested meal: key ingredients with quantities for 2-3 people, prep and cook \
time, 3-4 main cooking steps, and basic nutritional info. Use common Indian \
ingredients, respect the stated dietary preferences, and keep the whole \
answer under 100 words.";

const VARIATION_INSTRUCTIONS: &str = "\
You are a creative cooking expert for Indian users. Suggest 3-4 variations \
for the given meal: a QUICK version, a HEALTHY version, a FUSION version, and \
a SEASONAL version. For each, give the key changes and when to use it. Keep \
it practical for Indian kitchens and under 100 words total.";

/// Render the preference context lines included in generation prompts.
///
/// Sentinel slots say nothing useful to the generator and are skipped.
fn preference_context(record: &PreferenceRecord) -> String {
    let mut lines = Vec::new();
    if let thali_prefs::SlotValue::Tags(tags) = &record.restrictions {
        lines.push(format!(
            "Dietary restrictions: {}",
            tags.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    if let thali_prefs::SlotValue::Tags(tags) = &record.allergies {
        lines.push(format!(
            "Allergies: {}",
            tags.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    if let thali_prefs::SlotValue::Tags(tags) = &record.cuisines {
        lines.push(format!(
            "Preferred cuisines: {}",
            tags.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    if !record.dislikes.is_empty() {
        lines.push(format!(
            "Dislikes: {}",
            record.dislikes.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    lines.join("\n")
}

/// Decode the preferences argument into a record, defaulting when absent.
fn record_from_args(args: &Value) -> Result<PreferenceRecord, ToolError> {
    match args.get("preferences") {
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|err| ToolError::SchemaViolation(format!("invalid preferences: {err}"))),
        None => Ok(PreferenceRecord::default()),
    }
}

/// Run one instruction-template prompt through the engine with retries.
///
/// Generation never writes preferences, so a failed or cancelled call
/// leaves no partial state behind.
async fn generate_text(
    ctx: &CapabilityContext,
    instructions: &str,
    prompt: String,
) -> Result<Value, ToolError> {
    let request = CompletionRequest {
        system: instructions.to_string(),
        messages: vec![ChatMessage::user(prompt)],
        capabilities: Vec::new(),
    };
    let outcome = retrying(ctx.engine.as_ref(), &request, ctx.max_attempts)
        .await
        .map_err(|err| ToolError::GenerationUnavailable(err.to_string()))?;
    match outcome {
        CompletionOutcome::Message(text) => Ok(json!(text)),
        CompletionOutcome::CapabilityCalls {
            preamble: Some(text),
            ..
        } if !text.trim().is_empty() => Ok(json!(text)),
        CompletionOutcome::CapabilityCalls { .. } => Err(ToolError::ExecutionFailed(
            "engine requested capabilities inside a generation call".to_string(),
        )),
    }
}

/// Generate meal recommendations from preferences and the current message.
#[derive(Debug)]
pub struct GenerateRecommendation;

#[async_trait]
impl Capability for GenerateRecommendation {
    fn name(&self) -> &str {
        "generate_recommendation"
    }

    fn description(&self) -> &str {
        "Generate three meal recommendations tailored to the user's \
         preferences and current message."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "preferences": { "type": "object", "description": "Preference record to tailor to" },
                "user_message": { "type": "string", "description": "The user's current request" },
            },
            "required": ["preferences"],
        })
    }

    fn side_effect(&self) -> SideEffect {
        SideEffect::Generate
    }

    async fn call(&self, ctx: &CapabilityContext, args: Value) -> Result<Value, ToolError> {
        let record = record_from_args(&args)?;
        let user_message = args
            .get("user_message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let mut prompt = preference_context(&record);
        if !user_message.is_empty() {
            if !prompt.is_empty() {
                prompt.push('\n');
            }
            prompt.push_str("User request: ");
            prompt.push_str(user_message);
        }
        if prompt.is_empty() {
            prompt.push_str("No stored preferences yet; suggest broadly appealing meals.");
        }
        generate_text(ctx, RECOMMENDATION_INSTRUCTIONS, prompt).await
    }
}

/// Generate a compact recipe for a named meal.
#[derive(Debug)]
pub struct GenerateRecipe;

#[async_trait]
impl Capability for GenerateRecipe {
    fn name(&self) -> &str {
        "generate_recipe"
    }

    fn description(&self) -> &str {
        "Generate a short recipe (ingredients, times, steps, nutrition) for a \
         specific meal, respecting the user's preferences."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "meal_name": { "type": "string", "description": "Meal to generate a recipe for" },
                "preferences": { "type": "object", "description": "Preference record to respect" },
            },
            "required": ["meal_name"],
        })
    }

    fn side_effect(&self) -> SideEffect {
        SideEffect::Generate
    }

    async fn call(&self, ctx: &CapabilityContext, args: Value) -> Result<Value, ToolError> {
        let meal_name = args
            .get("meal_name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ToolError::SchemaViolation("missing required argument: meal_name".to_string())
            })?;
        let record = record_from_args(&args)?;
        let context = preference_context(&record);
        let prompt = if context.is_empty() {
            format!("MEAL: {meal_name}")
        } else {
            format!("MEAL: {meal_name}\n{context}")
        };
        generate_text(ctx, RECIPE_INSTRUCTIONS, prompt).await
    }
}

/// Suggest variations on a named meal.
#[derive(Debug)]
pub struct GenerateRecipeVariation;

#[async_trait]
impl Capability for GenerateRecipeVariation {
    fn name(&self) -> &str {
        "generate_recipe_variation"
    }

    fn description(&self) -> &str {
        "Suggest quick, healthy, fusion and seasonal variations for a \
         specific meal, respecting the user's preferences."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "meal_name": { "type": "string", "description": "Meal to vary" },
                "preferences": { "type": "object", "description": "Preference record to respect" },
            },
            "required": ["meal_name"],
        })
    }

    fn side_effect(&self) -> SideEffect {
        SideEffect::Generate
    }

    async fn call(&self, ctx: &CapabilityContext, args: Value) -> Result<Value, ToolError> {
        let meal_name = args
            .get("meal_name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ToolError::SchemaViolation("missing required argument: meal_name".to_string())
            })?;
        let record = record_from_args(&args)?;
        let context = preference_context(&record);
        let prompt = if context.is_empty() {
            format!("MEAL: {meal_name}")
        } else {
            format!("MEAL: {meal_name}\n{context}")
        };
        generate_text(ctx, VARIATION_INSTRUCTIONS, prompt).await
    }
}
