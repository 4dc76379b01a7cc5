//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::types::AgentToolParameters;
use crate::error::ReelError;
use crate::notify::Notifier;
use crate::types::{Notification, SessionContext};

/// Context available during tool execution.
///
/// Carries the calling session's identity and channel routing so tools can
/// message the user directly. A context without a notifier (the MCP gateway,
/// the REST mirror) silently drops those messages.
#[derive(Clone, Default)]
pub struct ToolExecutionContext {
    pub session: SessionContext,
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl ToolExecutionContext {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Send a message to the session's originating channel.
    pub async fn notify(&self, title: Option<&str>, text: impl Into<String>) -> Result<(), ReelError> {
        match &self.notifier {
            Some(notifier) => {
                notifier
                    .post(Notification::to_session(&self.session, title, text))
                    .await
            }
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for ToolExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExecutionContext")
            .field("session", &self.session)
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

/// Core tool trait. Implement to create custom tools.
///
/// Tools are expected to turn their own failures into a descriptive string
/// result. Returning `Err` aborts the whole reasoning turn.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema parameters.
    fn parameters(&self) -> &AgentToolParameters;

    /// Progress text shown to the user before the tool runs.
    ///
    /// `None` falls back to the call's `explanation` argument.
    fn progress_message(&self, _args: &ToolArguments) -> Option<String> {
        None
    }

    /// Execute the tool with parsed arguments.
    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ReelError>;
}

type ToolHandler = dyn Fn(
        ToolArguments,
        ToolExecutionContext,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ReelError>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct AgentTool {
    name: String,
    description: String,
    parameters: AgentToolParameters,
    handler: Arc<ToolHandler>,
}

impl AgentTool {
    /// Create a tool from a closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: AgentToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, ReelError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ReelError> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
