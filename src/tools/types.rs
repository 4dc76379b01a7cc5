//! Tool parameter schemas.

use serde::{Deserialize, Serialize};

/// Name of the argument every tool schema must declare as a required string.
///
/// The model fills it with a short, user-facing sentence describing why it is
/// calling the tool; the execution contract surfaces it as a progress note.
pub const EXPLANATION_FIELD: &str = "explanation";

const EXPLANATION_DESCRIPTION: &str =
    "Clear explanation of why this tool is being used in the current context";

/// JSON Schema-based parameter definition for a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentToolParameters {
    /// JSON Schema object describing the parameters.
    pub schema: serde_json::Value,
}

impl AgentToolParameters {
    /// Create from a raw JSON Schema value.
    pub fn from_schema(schema: serde_json::Value) -> Self {
        Self { schema }
    }

    /// Builder: create an object schema with properties.
    pub fn object() -> ParameterBuilder {
        ParameterBuilder {
            properties: serde_json::Map::new(),
            required: Vec::new(),
        }
    }

    /// Whether the schema declares `explanation` as a required string.
    pub fn requires_explanation(&self) -> bool {
        let declared_string = self
            .schema
            .get("properties")
            .and_then(|p| p.get(EXPLANATION_FIELD))
            .and_then(|p| p.get("type"))
            .and_then(|t| t.as_str())
            == Some("string");
        let required = self
            .schema
            .get("required")
            .and_then(|r| r.as_array())
            .is_some_and(|r| r.iter().any(|v| v.as_str() == Some(EXPLANATION_FIELD)));
        declared_string && required
    }
}

/// Builder for constructing tool parameter schemas.
pub struct ParameterBuilder {
    properties: serde_json::Map<String, serde_json::Value>,
    required: Vec<String>,
}

impl ParameterBuilder {
    fn property(mut self, name: impl Into<String>, schema: serde_json::Value, required: bool) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), schema);
        if required {
            self.required.push(name);
        }
        self
    }

    /// Add the mandatory `explanation` string property.
    pub fn explanation(self) -> Self {
        self.string(EXPLANATION_FIELD, EXPLANATION_DESCRIPTION, true)
    }

    /// Add a string property.
    pub fn string(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.property(
            name,
            serde_json::json!({ "type": "string", "description": description.into() }),
            required,
        )
    }

    /// Add an integer property.
    pub fn integer(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.property(
            name,
            serde_json::json!({ "type": "integer", "description": description.into() }),
            required,
        )
    }

    /// Add an optional string property with a documented default.
    pub fn string_with_default(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        default: &str,
    ) -> Self {
        self.property(
            name,
            serde_json::json!({
                "type": "string",
                "description": description.into(),
                "default": default,
            }),
            false,
        )
    }

    /// Add an enum (string) property.
    pub fn string_enum(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: &[&str],
        required: bool,
    ) -> Self {
        self.property(
            name,
            serde_json::json!({
                "type": "string",
                "description": description.into(),
                "enum": values,
            }),
            required,
        )
    }

    /// Build into AgentToolParameters.
    pub fn build(self) -> AgentToolParameters {
        AgentToolParameters {
            schema: serde_json::json!({
                "type": "object",
                "properties": self.properties,
                "required": self.required,
            }),
        }
    }
}
