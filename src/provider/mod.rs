//! Reasoning engine boundary and the bundled OpenAI-compatible engine.

pub mod http;
pub mod sanitize;

#[cfg(feature = "openai")]
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LlmSettings;
use crate::error::ReelError;
use crate::stream::StreamingSink;
use crate::tools::Tool;
use crate::types::{AgentToolCall, ModelMessage, Usage};

/// A request sent to a reasoning engine.
#[derive(Debug, Clone, Default)]
pub struct EngineRequest {
    pub messages: Vec<ModelMessage>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: Option<f32>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters().schema.clone(),
        }
    }
}

/// Result of one engine call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineResponse {
    /// The complete text generated by this call.
    pub text: String,
    pub tool_calls: Vec<AgentToolCall>,
    pub usage: Usage,
}

/// One model call: messages and tools in, text and tool calls out.
///
/// Implementations push generated text into `sink` as it is produced; the
/// returned `text` is the same text, assembled.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &str;

    async fn complete(
        &self,
        request: &EngineRequest,
        sink: &StreamingSink,
    ) -> Result<EngineResponse, ReelError>;
}

/// Builds one engine per agent session.
pub trait EngineFactory: Send + Sync {
    /// Fails with [`ReelError::Configuration`] when the settings cannot
    /// produce a working engine.
    fn create(&self, settings: &LlmSettings) -> Result<Arc<dyn ReasoningEngine>, ReelError>;
}
