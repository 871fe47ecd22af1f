//! Preference read, write, and completeness capabilities.

use crate::context::CapabilityContext;
use crate::tool::Capability;
use async_trait::async_trait;
use serde_json::{Value, json};
use thali_prefs::{PreferenceRecord, PreferenceStore, PreferenceUpdate};
use thali_protocol::{SideEffect, ToolError};

/// Pull a required string argument out of a validated bundle.
fn require_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::SchemaViolation(format!("missing required argument: {name}")))
}

/// Decode the preferences argument, treating absence as the empty record.
fn record_from_args(args: &Value) -> Result<PreferenceRecord, ToolError> {
    match args.get("preferences") {
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|err| ToolError::SchemaViolation(format!("invalid preferences: {err}"))),
        None => Ok(PreferenceRecord::default()),
    }
}

/// Serialize a record into a capability result payload.
fn record_to_value(record: &PreferenceRecord) -> Result<Value, ToolError> {
    serde_json::to_value(record).map_err(|err| ToolError::ExecutionFailed(err.to_string()))
}

/// Read the stored preference record for a user.
#[derive(Debug)]
pub struct ReadPreferences;

#[async_trait]
impl Capability for ReadPreferences {
    fn name(&self) -> &str {
        "read_preferences"
    }

    fn description(&self) -> &str {
        "Read the user's current food preferences. Returns an empty record when none are stored."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": { "type": "string", "description": "User whose preferences to read" },
            },
            "required": ["user_id"],
        })
    }

    fn side_effect(&self) -> SideEffect {
        SideEffect::Read
    }

    async fn call(&self, ctx: &CapabilityContext, args: Value) -> Result<Value, ToolError> {
        let user_id = require_str(&args, "user_id")?;
        let record = ctx
            .preferences
            .get(user_id)
            .map_err(|err| ToolError::StoreUnavailable(err.to_string()))?
            .unwrap_or_default();
        record_to_value(&record)
    }
}

/// Merge a partial preference record into the stored one.
#[derive(Debug)]
pub struct WritePreferences;

#[async_trait]
impl Capability for WritePreferences {
    fn name(&self) -> &str {
        "write_preferences"
    }

    fn description(&self) -> &str {
        "Merge a partial preference record into the user's stored preferences. \
         Mandatory slots (restrictions, allergies, cuisines) are replaced; \
         likes, dislikes and notes are unioned. Returns the merged record."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": { "type": "string", "description": "User whose preferences to update" },
                "preferences": {
                    "type": "object",
                    "description": "Partial record; slot values are tag lists or the string \"none\"",
                },
            },
            "required": ["user_id", "preferences"],
        })
    }

    fn side_effect(&self) -> SideEffect {
        SideEffect::Write
    }

    async fn call(&self, ctx: &CapabilityContext, args: Value) -> Result<Value, ToolError> {
        let user_id = require_str(&args, "user_id")?;
        let update: PreferenceUpdate = args
            .get("preferences")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|err| ToolError::SchemaViolation(format!("invalid preferences: {err}")))?
            .unwrap_or_default();
        let record = ctx
            .preferences
            .merge(user_id, &update)
            .map_err(|err| ToolError::StoreUnavailable(err.to_string()))?;
        record_to_value(&record)
    }
}

/// Record exactly one preference fact extracted from free text.
#[derive(Debug)]
pub struct AddSinglePreference;

#[async_trait]
impl Capability for AddSinglePreference {
    fn name(&self) -> &str {
        "add_single_preference"
    }

    fn description(&self) -> &str {
        "Record a single preference fact. Categories: restrictions, allergies, \
         cuisines, likes, dislikes, notes. Use the value \"none\" to record that \
         the user explicitly has nothing for a mandatory category."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": { "type": "string", "description": "User whose preferences to update" },
                "category": { "type": "string", "description": "Preference category" },
                "value": { "type": "string", "description": "Preference value" },
            },
            "required": ["user_id", "category", "value"],
        })
    }

    fn side_effect(&self) -> SideEffect {
        SideEffect::Write
    }

    async fn call(&self, ctx: &CapabilityContext, args: Value) -> Result<Value, ToolError> {
        let user_id = require_str(&args, "user_id")?;
        let category = require_str(&args, "category")?;
        let value = require_str(&args, "value")?;
        let update = PreferenceUpdate::single(category, value);
        let record = ctx
            .preferences
            .merge(user_id, &update)
            .map_err(|err| ToolError::StoreUnavailable(err.to_string()))?;
        record_to_value(&record)
    }
}

/// List the mandatory slots still missing from a record.
#[derive(Debug)]
pub struct MissingMandatory;

#[async_trait]
impl Capability for MissingMandatory {
    fn name(&self) -> &str {
        "missing_mandatory"
    }

    fn description(&self) -> &str {
        "List which mandatory preference slots (restrictions, allergies, cuisines) \
         are still unknown, in the order they should be asked about."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "preferences": { "type": "object", "description": "Preference record to inspect" },
            },
            "required": [],
        })
    }

    fn side_effect(&self) -> SideEffect {
        SideEffect::Compute
    }

    async fn call(&self, _ctx: &CapabilityContext, args: Value) -> Result<Value, ToolError> {
        let record = record_from_args(&args)?;
        let missing: Vec<&str> = record
            .missing_mandatory()
            .into_iter()
            .map(|slot| slot.as_str())
            .collect();
        Ok(json!(missing))
    }
}

/// Report whether every mandatory slot holds a value.
#[derive(Debug)]
pub struct HasCompletePreferences;

#[async_trait]
impl Capability for HasCompletePreferences {
    fn name(&self) -> &str {
        "has_complete_preferences"
    }

    fn description(&self) -> &str {
        "Report whether the user has answered every mandatory preference slot."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "preferences": { "type": "object", "description": "Preference record to inspect" },
            },
            "required": [],
        })
    }

    fn side_effect(&self) -> SideEffect {
        SideEffect::Compute
    }

    async fn call(&self, _ctx: &CapabilityContext, args: Value) -> Result<Value, ToolError> {
        let record = record_from_args(&args)?;
        Ok(json!(record.is_complete()))
    }
}
