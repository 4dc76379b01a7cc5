//! Validate tool call arguments against JSON Schema before execution.

use serde_json::Value;

/// Validate tool arguments against a JSON Schema.
///
/// Performs top-level validation: schema type check, required field presence,
/// property type verification and string enum membership. A `null` value for
/// an optional property counts as absent. Returns `Err(message)` describing
/// the first violation found.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<(), String> {
    if schema.get("type").and_then(Value::as_str) == Some("object") && !args.is_object() {
        return Err(format!(
            "expected object arguments, got {}",
            json_type_name(args)
        ));
    }

    let Some(obj) = args.as_object() else {
        return Ok(());
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            match obj.get(name) {
                None | Some(Value::Null) => {
                    return Err(format!("missing required field '{name}'"));
                }
                Some(_) => {}
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    for (key, value) in obj {
        let Some(prop_schema) = properties.get(key) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        if let Some(expected_type) = prop_schema.get("type").and_then(Value::as_str) {
            if !value_matches_type(value, expected_type) {
                return Err(format!(
                    "field '{}' expected type '{}', got {}",
                    key,
                    expected_type,
                    json_type_name(value)
                ));
            }
        }
        if let Some(allowed) = prop_schema.get("enum").and_then(Value::as_array) {
            if !allowed.contains(value) {
                let choices: Vec<String> = allowed.iter().map(Value::to_string).collect();
                return Err(format!(
                    "field '{key}' must be one of [{}], got {value}",
                    choices.join(", ")
                ));
            }
        }
    }

    Ok(())
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "explanation": { "type": "string" },
                "season": { "type": "integer" },
                "media_type": { "type": "string", "enum": ["movie", "tv"] },
            },
            "required": ["title", "explanation"],
        })
    }

    #[test]
    fn rejects_non_object_args_when_schema_expects_object() {
        let result = validate_arguments(&json!("The Matrix"), &search_schema());

        assert!(result.unwrap_err().contains("expected object"));
    }

    #[test]
    fn rejects_missing_required_field() {
        let args = json!({ "title": "The Matrix" });

        let result = validate_arguments(&args, &search_schema());

        assert!(result
            .unwrap_err()
            .contains("missing required field 'explanation'"));
    }

    #[test]
    fn null_required_field_counts_as_missing() {
        let args = json!({ "title": null, "explanation": "why" });

        let result = validate_arguments(&args, &search_schema());

        assert!(result.unwrap_err().contains("'title'"));
    }

    #[test]
    fn accepts_valid_args_with_optional_fields_absent_or_null() {
        let schema = search_schema();

        assert!(validate_arguments(&json!({ "title": "Dark", "explanation": "x" }), &schema).is_ok());
        assert!(validate_arguments(
            &json!({ "title": "Dark", "explanation": "x", "season": null }),
            &schema
        )
        .is_ok());
    }

    #[test]
    fn rejects_field_with_wrong_type() {
        let args = json!({ "title": "Dark", "explanation": "x", "season": "two" });

        let err = validate_arguments(&args, &search_schema()).unwrap_err();

        assert!(err.contains("field 'season'"));
        assert!(err.contains("expected type 'integer'"));
    }

    #[test]
    fn rejects_value_outside_enum() {
        let args = json!({ "title": "Dark", "explanation": "x", "media_type": "anime" });

        let err = validate_arguments(&args, &search_schema()).unwrap_err();

        assert!(err.contains("field 'media_type' must be one of"));
    }

    #[test]
    fn accepts_extra_fields_not_in_schema_properties() {
        let args = json!({ "title": "Dark", "explanation": "x", "extra": true });

        assert!(validate_arguments(&args, &search_schema()).is_ok());
    }

    #[test]
    fn accepts_anything_when_schema_is_empty() {
        assert!(validate_arguments(&json!({ "anything": 42 }), &json!({})).is_ok());
        assert!(validate_arguments(&Value::Null, &json!({})).is_ok());
    }
}
