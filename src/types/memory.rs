//! Conversation memory records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Role of a persisted conversation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MemoryRole {
    User,
    Agent,
    ToolCall,
    ToolResult,
    System,
}

/// Metadata recorded alongside a `tool_call` record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallMetadata {
    pub call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// One append-only entry of the conversation log for a (session, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    pub session_id: String,
    pub user_id: String,
    pub role: MemoryRole,
    /// Text content; `None` for tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ToolCallMetadata>,
    pub timestamp: DateTime<Utc>,
}

impl MemoryRecord {
    /// Create a plain text record of the given role.
    pub fn text(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        role: MemoryRole,
        content: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            role,
            content: Some(content.into()),
            metadata: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a `tool_call` record.
    pub fn tool_call(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            role: MemoryRole::ToolCall,
            content: None,
            metadata: Some(ToolCallMetadata {
                call_id: call_id.into(),
                tool_name: tool_name.into(),
                parameters,
            }),
            timestamp: Utc::now(),
        }
    }

    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}
