//! Bounded model/tool loop.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::types::{ReasoningTrace, ToolStep, TurnOutcome};
use crate::error::ReelError;
use crate::provider::{EngineRequest, ReasoningEngine, ToolDefinition};
use crate::stream::StreamingSink;
use crate::tools::{ToolArguments, ToolCatalog, ToolExecutionContract};
use crate::types::{ModelMessage, SessionContext};

/// Everything one run reads.
pub struct LoopInput<'a> {
    /// Full prompt: system message, history and the new user message.
    pub messages: Vec<ModelMessage>,
    pub catalog: &'a ToolCatalog,
    pub contract: &'a ToolExecutionContract,
    pub session: &'a SessionContext,
    pub sink: &'a StreamingSink,
    pub cancel: &'a CancellationToken,
}

/// Alternates model calls and tool calls until the model stops asking for
/// tools or the iteration cap is hit.
///
/// Hitting the cap stops the run without a further model call.
pub struct ReasoningLoop {
    engine: Arc<dyn ReasoningEngine>,
    max_iterations: usize,
    temperature: Option<f32>,
}

impl ReasoningLoop {
    pub fn new(engine: Arc<dyn ReasoningEngine>, max_iterations: usize) -> Self {
        Self {
            engine,
            max_iterations: max_iterations.max(1),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub async fn run(&self, input: LoopInput<'_>) -> TurnOutcome {
        let LoopInput {
            mut messages,
            catalog,
            contract,
            session,
            sink,
            cancel,
        } = input;
        let tools: Vec<ToolDefinition> = catalog
            .tools()
            .iter()
            .map(|t| ToolDefinition::from_tool(t.as_ref()))
            .collect();
        let mut trace = ReasoningTrace::default();

        for iteration in 1..=self.max_iterations {
            trace.iterations = iteration;
            let request = EngineRequest {
                messages: messages.clone(),
                tools: tools.clone(),
                temperature: self.temperature,
            };

            let response = tokio::select! {
                _ = cancel.cancelled() => return TurnOutcome::Cancelled,
                response = self.engine.complete(&request, sink) => response,
            };
            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    warn!(session_id = %session.session_id, iteration, error = %e, "model call failed");
                    return TurnOutcome::Failed(e.to_string());
                }
            };
            trace.usage.merge(&response.usage);
            debug!(
                session_id = %session.session_id,
                iteration,
                tool_calls = response.tool_calls.len(),
                text_len = response.text.len(),
                "model call complete"
            );

            if response.tool_calls.is_empty() {
                if !response.text.is_empty() {
                    trace.messages.push(ModelMessage::assistant(response.text));
                }
                return TurnOutcome::Completed(trace);
            }

            let assistant = ModelMessage::assistant_tool_calls(response.text, response.tool_calls.clone());
            messages.push(assistant.clone());
            trace.messages.push(assistant);

            for call in response.tool_calls {
                let args = ToolArguments::new(call.arguments.clone());
                let (result, is_error) = match catalog.get(&call.name) {
                    Some(tool) => match contract.run(tool.as_ref(), &args, session, cancel).await {
                        Ok(result) => (result, false),
                        Err(ReelError::Cancelled) => return TurnOutcome::Cancelled,
                        Err(e) => {
                            warn!(session_id = %session.session_id, tool = %call.name, error = %e, "tool failed");
                            return TurnOutcome::Failed(e.to_string());
                        }
                    },
                    None => {
                        warn!(session_id = %session.session_id, tool = %call.name, "model called an unknown tool");
                        (Value::String(format!("Tool '{}' not found", call.name)), true)
                    }
                };

                let message = ModelMessage::tool_result(call.id.clone(), result.clone(), is_error);
                messages.push(message.clone());
                trace.messages.push(message);
                trace.steps.push(ToolStep { call, result });
            }
        }

        info!(
            session_id = %session.session_id,
            max_iterations = self.max_iterations,
            "iteration limit reached; stopping"
        );
        trace.stopped_early = true;
        TurnOutcome::Completed(trace)
    }
}
