//! JSON-RPC 2.0 envelopes and MCP error codes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// Error codes returned by the gateway.
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// No live protocol session matches the supplied (or missing) id.
    pub const UNKNOWN_SESSION: i64 = -32002;
    /// The session exists but has not finished the initialize handshake.
    pub const SESSION_NOT_READY: i64 = -32003;
}

/// A decoded request or notification.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    /// `None` for notifications.
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Params as an object; absent params read as an empty object.
    pub fn params_object(&self) -> Result<Map<String, Value>, JsonRpcError> {
        match &self.params {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(JsonRpcError::new(codes::INVALID_PARAMS, "params must be an object")),
        }
    }

    /// Validate a single JSON-RPC envelope.
    ///
    /// On failure returns the error together with whatever id could be
    /// recovered, so the caller can still echo it.
    pub fn from_value(value: Value) -> Result<Self, (Value, JsonRpcError)> {
        let Value::Object(mut envelope) = value else {
            let message = if value.is_array() {
                "batch requests are not supported"
            } else {
                "request must be a JSON object"
            };
            return Err((Value::Null, JsonRpcError::new(codes::INVALID_REQUEST, message)));
        };

        let id = envelope.remove("id");
        let echo = id.clone().unwrap_or(Value::Null);
        if let Some(id) = &id {
            if !(id.is_string() || id.is_number() || id.is_null()) {
                return Err((
                    Value::Null,
                    JsonRpcError::new(codes::INVALID_REQUEST, "id must be a string, number or null"),
                ));
            }
        }
        if envelope.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err((
                echo,
                JsonRpcError::new(codes::INVALID_REQUEST, "jsonrpc must be \"2.0\""),
            ));
        }
        let method = match envelope.remove("method") {
            Some(Value::String(method)) if !method.is_empty() => method,
            _ => {
                return Err((
                    echo,
                    JsonRpcError::new(codes::INVALID_REQUEST, "method must be a non-empty string"),
                ))
            }
        };

        Ok(Self {
            id,
            method,
            params: envelope.remove("params"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": null,
                "error": { "code": codes::INTERNAL_ERROR, "message": e.to_string() },
            })
        })
    }
}

/// `tools/call` result envelope.
pub fn tool_result_envelope(text: impl Into<String>, is_error: bool) -> Value {
    serde_json::json!({
        "content": [{ "type": "text", "text": text.into() }],
        "isError": is_error,
    })
}
