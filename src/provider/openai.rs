//! OpenAI-compatible Chat Completions engine (streaming).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, trace};

use super::http::{bearer_headers, client_for, parse_sse_data, status_to_error};
use super::sanitize::sanitize_tool_pairing;
use super::{EngineFactory, EngineRequest, EngineResponse, ReasoningEngine};
use crate::config::{LlmSettings, SUPPORTED_PROVIDERS};
use crate::error::ReelError;
use crate::stream::StreamingSink;
use crate::types::*;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

pub struct OpenAiEngine {
    provider: String,
    model: String,
    api_key: String,
    base_url: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiEngine {
    /// Build an engine from settings.
    ///
    /// Fails with a configuration error for an unknown provider, a missing
    /// API key or an invalid proxy.
    pub fn new(settings: &LlmSettings) -> Result<Self, ReelError> {
        let provider = settings.provider.trim().to_lowercase();
        let default_base = match provider.as_str() {
            "openai" => OPENAI_BASE_URL,
            "deepseek" => DEEPSEEK_BASE_URL,
            other => {
                return Err(ReelError::Configuration(format!(
                    "unsupported LLM provider '{other}' (supported: {})",
                    SUPPORTED_PROVIDERS.join(", ")
                )))
            }
        };
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ReelError::Configuration("missing LLM API key (REEL_LLM_API_KEY)".into()))?;
        let base_url = settings
            .base_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| default_base.to_string());

        Ok(Self {
            provider,
            model: settings.model.clone(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: settings.temperature,
            client: client_for(settings.proxy.as_deref())?,
        })
    }

    fn build_request_body(&self, request: &EngineRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = sanitize_tool_pairing(&request.messages)
            .iter()
            .map(message_to_openai)
            .collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
            "stream_options": { "include_usage": true },
            "temperature": request.temperature.unwrap_or(self.temperature),
        });

        if !request.tools.is_empty() {
            let tool_defs: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = tool_defs.into();
        }

        body
    }
}

impl std::fmt::Debug for OpenAiEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEngine")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ReasoningEngine for OpenAiEngine {
    fn provider_name(&self) -> &str {
        &self.provider
    }

    async fn complete(
        &self,
        request: &EngineRequest,
        sink: &StreamingSink,
    ) -> Result<EngineResponse, ReelError> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(provider = %self.provider, model = %self.model, messages = request.messages.len(), "chat completion");

        let resp = self
            .client
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let mut state = StreamState::default();
        let mut buffer: Vec<u8> = Vec::new();
        let mut byte_stream = resp.bytes_stream();
        while let Some(chunk) = byte_stream.next().await {
            buffer.extend_from_slice(&chunk?);
            while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=line_end).collect();
                state.feed_line(&String::from_utf8_lossy(&line), sink).await;
            }
        }
        if !buffer.is_empty() {
            state.feed_line(&String::from_utf8_lossy(&buffer), sink).await;
        }

        Ok(state.finish())
    }
}

/// Accumulates one streamed completion.
#[derive(Default)]
struct StreamState {
    text: String,
    tool_calls: BTreeMap<usize, PartialToolCall>,
    usage: Usage,
}

#[derive(Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

impl StreamState {
    async fn feed_line(&mut self, line: &str, sink: &StreamingSink) {
        let line = line.trim();
        if line.is_empty() || line.starts_with(':') {
            return;
        }
        let Some(data) = parse_sse_data(line) else {
            return;
        };
        let chunk = match serde_json::from_str::<OpenAiStreamChunk>(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                trace!(error = %e, "skipping unparseable stream chunk");
                return;
            }
        };

        if let Some(usage) = chunk.usage {
            self.usage = Usage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            };
        }
        for choice in chunk.choices {
            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                sink.push(&content).await;
                self.text.push_str(&content);
            }
            for delta in choice.delta.tool_calls.unwrap_or_default() {
                let call = self.tool_calls.entry(delta.index).or_default();
                if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
                    call.id = Some(id);
                }
                if let Some(function) = delta.function {
                    if let Some(name) = function.name {
                        call.name.push_str(&name);
                    }
                    if let Some(arguments) = function.arguments {
                        call.arguments.push_str(&arguments);
                    }
                }
            }
        }
    }

    fn finish(self) -> EngineResponse {
        let tool_calls = self
            .tool_calls
            .into_iter()
            .filter(|(_, call)| !call.name.is_empty())
            .map(|(index, call)| AgentToolCall {
                id: call.id.unwrap_or_else(|| format!("call_{index}")),
                name: call.name,
                arguments: parse_arguments(call.arguments),
            })
            .collect();
        EngineResponse {
            text: self.text,
            tool_calls,
            usage: self.usage,
        }
    }
}

fn parse_arguments(raw: String) -> serde_json::Value {
    if raw.trim().is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
}

fn tool_result_content(result: &serde_json::Value) -> String {
    match result {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn message_to_openai(msg: &ModelMessage) -> serde_json::Value {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let tool_result = msg.content.iter().find_map(|part| match part {
        ContentPart::ToolResult(tr) => Some(tr),
        _ => None,
    });
    if let Some(tr) = tool_result {
        return serde_json::json!({
            "role": "tool",
            "tool_call_id": tr.tool_call_id,
            "content": tool_result_content(&tr.result),
        });
    }

    let tool_calls = msg.tool_calls();
    if !tool_calls.is_empty() {
        let tc_json: Vec<serde_json::Value> = tool_calls
            .iter()
            .map(|tc| {
                serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": {
                        "name": tc.name,
                        "arguments": tc.arguments.to_string(),
                    }
                })
            })
            .collect();
        let text = msg.text();
        return serde_json::json!({
            "role": role,
            "content": if text.is_empty() { serde_json::Value::Null } else { serde_json::Value::String(text) },
            "tool_calls": tc_json,
        });
    }

    serde_json::json!({ "role": role, "content": msg.text() })
}

/// Builds [`OpenAiEngine`]s for the `openai` and `deepseek` providers.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiEngineFactory;

impl EngineFactory for OpenAiEngineFactory {
    fn create(&self, settings: &LlmSettings) -> Result<Arc<dyn ReasoningEngine>, ReelError> {
        Ok(Arc::new(OpenAiEngine::new(settings)?))
    }
}

// OpenAI API stream types (internal)

#[derive(Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiStreamDelta,
}

#[derive(Deserialize)]
struct OpenAiStreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCallDelta>>,
}

#[derive(Deserialize)]
struct OpenAiToolCallDelta {
    #[serde(default)]
    index: usize,
    id: Option<String>,
    function: Option<OpenAiFunctionDelta>,
}

#[derive(Deserialize)]
struct OpenAiFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
