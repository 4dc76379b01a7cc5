//! Typed access to tool call arguments.

use crate::error::ReelError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    /// Wrap raw arguments.
    ///
    /// Some models send arguments as a JSON-encoded string; those are decoded
    /// here so every accessor sees an object.
    pub fn new(value: serde_json::Value) -> Self {
        let value = match value {
            serde_json::Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(trimmed).unwrap_or(serde_json::Value::String(raw))
                }
            }
            serde_json::Value::Null => serde_json::json!({}),
            other => other,
        };
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, ReelError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ReelError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument. Empty strings count as absent.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// Get an integer argument.
    pub fn get_i64(&self, key: &str) -> Result<i64, ReelError> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| ReelError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    /// Get an optional integer argument.
    pub fn get_i64_opt(&self, key: &str) -> Option<i64> {
        self.value.get(key).and_then(|v| v.as_i64())
    }

    /// The model-supplied reason for this call, if present.
    pub fn explanation(&self) -> Option<&str> {
        self.get_str_opt(super::types::EXPLANATION_FIELD)
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, ReelError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            ReelError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_string_encoded_arguments() {
        let args = ToolArguments::new(json!("{\"title\": \"Alien\"}"));
        assert_eq!(args.get_str("title").unwrap(), "Alien");
    }

    #[test]
    fn null_arguments_become_empty_object() {
        let args = ToolArguments::new(serde_json::Value::Null);
        assert!(args.raw().is_object());
        assert!(args.get_str("title").is_err());
    }

    #[test]
    fn optional_accessors_skip_blank_values() {
        let args = ToolArguments::new(json!({ "year": " ", "season": 2, "explanation": "why" }));
        assert_eq!(args.get_str_opt("year"), None);
        assert_eq!(args.get_i64_opt("season"), Some(2));
        assert_eq!(args.explanation(), Some("why"));
    }

    #[test]
    fn deserialize_into_struct() {
        #[derive(serde::Deserialize)]
        struct Params {
            title: String,
            season: Option<u32>,
        }

        let params: Params = ToolArguments::new(json!({ "title": "Dark", "season": 3 }))
            .deserialize()
            .unwrap();
        assert_eq!(params.title, "Dark");
        assert_eq!(params.season, Some(3));
    }
}
