//! Argument validation against declared capability schemas.

use serde_json::Value;
use thali_protocol::ToolError;

/// Validate an argument bundle against a capability schema.
///
/// Supports the schema subset the builtin capabilities declare: an object
/// type with `properties` (each carrying a `type` of string, object, array,
/// boolean or number) and a `required` list. Arguments are rejected, never
/// coerced: missing required properties, unknown properties, and type
/// mismatches all fail with a `SchemaViolation`.
pub fn validate_args(schema: &Value, args: &Value) -> Result<(), ToolError> {
    let Some(schema_obj) = schema.as_object() else {
        return Ok(());
    };
    if schema_obj.get("type").and_then(Value::as_str) != Some("object") {
        return Ok(());
    }

    let Some(args_obj) = args.as_object() else {
        return Err(ToolError::SchemaViolation(
            "arguments must be an object".to_string(),
        ));
    };

    if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !args_obj.contains_key(name) {
                return Err(ToolError::SchemaViolation(format!(
                    "missing required argument: {name}"
                )));
            }
        }
    }

    if let Some(properties) = schema_obj.get("properties").and_then(Value::as_object) {
        for (name, value) in args_obj {
            let Some(property) = properties.get(name) else {
                return Err(ToolError::SchemaViolation(format!(
                    "unexpected argument: {name}"
                )));
            };
            check_type(name, property, value)?;
        }
    }

    Ok(())
}

/// Check a single argument value against its property schema.
fn check_type(name: &str, property: &Value, value: &Value) -> Result<(), ToolError> {
    let Some(expected) = property.get("type").and_then(Value::as_str) else {
        return Ok(());
    };
    let matches = match expected {
        "string" => value.is_string(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "boolean" => value.is_boolean(),
        "number" | "integer" => value.is_number(),
        _ => true,
    };
    if matches {
        Ok(())
    } else {
        Err(ToolError::SchemaViolation(format!(
            "argument {name} must be of type {expected}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::validate_args;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use thali_protocol::ToolError;

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": { "type": "string" },
                "preferences": { "type": "object" },
            },
            "required": ["user_id"],
        })
    }

    #[test]
    fn accepts_valid_arguments() {
        let args = json!({ "user_id": "u1", "preferences": {} });
        assert!(validate_args(&schema(), &args).is_ok());
    }

    #[test]
    fn rejects_missing_required() {
        let err = validate_args(&schema(), &json!({ "preferences": {} })).expect_err("violation");
        match err {
            ToolError::SchemaViolation(message) => {
                assert_eq!(message, "missing required argument: user_id");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_arguments() {
        let args = json!({ "user_id": "u1", "extra": 1 });
        assert!(matches!(
            validate_args(&schema(), &args),
            Err(ToolError::SchemaViolation(_))
        ));
    }

    #[test]
    fn rejects_type_mismatches_without_coercion() {
        let args = json!({ "user_id": 42 });
        assert!(matches!(
            validate_args(&schema(), &args),
            Err(ToolError::SchemaViolation(_))
        ));
    }

    #[test]
    fn rejects_non_object_arguments() {
        assert!(matches!(
            validate_args(&schema(), &json!("user_id=u1")),
            Err(ToolError::SchemaViolation(_))
        ));
    }
}
