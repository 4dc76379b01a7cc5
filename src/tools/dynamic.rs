//! Tool sets supplied from outside the crate.
//!
//! A [`DynamicToolProvider`] announces its tools once, when a catalog is
//! built. Each announced tool that passes the catalog's contract check is
//! wrapped in a [`DynamicToolAdapter`] and becomes indistinguishable from a
//! built-in tool: it goes through the same execution contract, receives the
//! calling session in its context and can message the user through it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::AgentToolParameters;
use crate::error::ReelError;

/// A tool announced by a provider.
#[derive(Debug, Clone)]
pub struct DynamicTool {
    pub name: String,
    pub description: String,
    pub parameters: AgentToolParameters,
}

impl DynamicTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: AgentToolParameters,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[async_trait]
pub trait DynamicToolProvider: Send + Sync {
    /// Identifier used in diagnostics.
    fn plugin_id(&self) -> &str;

    async fn list_tools(&self) -> Result<Vec<DynamicTool>, ReelError>;

    /// Progress text for a call of `name`; `None` falls back to the call's
    /// `explanation`.
    fn progress_message(&self, _name: &str, _args: &ToolArguments) -> Option<String> {
        None
    }

    /// Run `name`. Failures the model can act on should come back as a
    /// descriptive string; `Err` fails the whole turn.
    async fn execute_tool(
        &self,
        name: &str,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<Value, ReelError>;
}

/// Catalog entry backed by a provider.
pub struct DynamicToolAdapter {
    provider: Arc<dyn DynamicToolProvider>,
    tool: DynamicTool,
}

impl DynamicToolAdapter {
    pub fn new(provider: Arc<dyn DynamicToolProvider>, tool: DynamicTool) -> Self {
        Self { provider, tool }
    }

    pub fn plugin_id(&self) -> &str {
        self.provider.plugin_id()
    }
}

#[async_trait]
impl Tool for DynamicToolAdapter {
    fn name(&self) -> &str {
        &self.tool.name
    }

    fn description(&self) -> &str {
        &self.tool.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.tool.parameters
    }

    fn progress_message(&self, args: &ToolArguments) -> Option<String> {
        self.provider.progress_message(&self.tool.name, args)
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<Value, ReelError> {
        debug!(
            plugin = self.plugin_id(),
            tool = %self.tool.name,
            session_id = %ctx.session.session_id,
            "delegating to tool provider"
        );
        self.provider.execute_tool(&self.tool.name, args, ctx).await
    }
}

impl std::fmt::Debug for DynamicToolAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicToolAdapter")
            .field("plugin", &self.plugin_id())
            .field("tool", &self.tool.name)
            .finish()
    }
}
