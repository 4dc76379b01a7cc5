//! Uniform wrapper around every tool call made by the reasoning loop.
//!
//! For one invocation the contract, in order:
//! 1. flushes pending streamed text to the user and records it as `agent`,
//! 2. records a `tool_call` with the full argument map,
//! 3. sends a progress note (tool override, else the `explanation` argument),
//! 4. validates and executes the tool,
//! 5. records the normalized result as `tool_result`,
//! 6. hands the raw result back to the loop.
//!
//! An `Err` from the tool stops at step 4 and leaves no `tool_result` behind.
//! Cancellation during step 4 records [`CANCELLED_TOOL_RESULT`] instead, so
//! every `tool_call` keeps its `tool_result`.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::arguments::ToolArguments;
use super::catalog::{invoke, normalize_result};
use super::tool::{Tool, ToolExecutionContext};
use crate::error::ReelError;
use crate::memory::ConversationMemory;
use crate::notify::Notifier;
use crate::stream::StreamingSink;
use crate::types::{MemoryRecord, MemoryRole, Notification, SessionContext};

/// Result recorded for a tool call abandoned by cancellation.
pub const CANCELLED_TOOL_RESULT: &str = "Tool call cancelled";

/// Collaborators shared by every tool call of one agent session.
#[derive(Clone)]
pub struct ToolExecutionContract {
    sink: Arc<StreamingSink>,
    memory: Arc<dyn ConversationMemory>,
    notifier: Arc<dyn Notifier>,
    title: Option<String>,
}

impl ToolExecutionContract {
    pub fn new(
        sink: Arc<StreamingSink>,
        memory: Arc<dyn ConversationMemory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            sink,
            memory,
            notifier,
            title: None,
        }
    }

    /// Title attached to flushed assistant text.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Run one tool call for `session`.
    ///
    /// Returns [`ReelError::Cancelled`] when `cancel` fires while the tool is
    /// executing.
    pub async fn run(
        &self,
        tool: &dyn Tool,
        args: &ToolArguments,
        session: &SessionContext,
        cancel: &CancellationToken,
    ) -> Result<Value, ReelError> {
        let name = tool.name();

        let pending = self.sink.take().await;
        if !pending.is_empty() {
            self.notifier
                .post(Notification::to_session(session, self.title.as_deref(), pending.clone()))
                .await?;
            self.memory
                .append(MemoryRecord::text(
                    &session.session_id,
                    &session.user_id,
                    MemoryRole::Agent,
                    pending,
                ))
                .await?;
        }

        // The tool name doubles as the call id.
        self.memory
            .append(MemoryRecord::tool_call(
                &session.session_id,
                &session.user_id,
                name,
                name,
                args.raw().clone(),
            ))
            .await?;

        let progress = tool
            .progress_message(args)
            .or_else(|| args.explanation().map(str::to_string));
        if let Some(progress) = progress {
            if let Err(e) = self
                .notifier
                .post(Notification::to_session(session, None, progress))
                .await
            {
                warn!(tool = name, error = %e, "progress notification failed");
            }
        }

        debug!(session_id = %session.session_id, tool = name, "executing tool");
        let ctx = ToolExecutionContext::new(session.clone()).with_notifier(self.notifier.clone());
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                info!(session_id = %session.session_id, tool = name, "tool call cancelled");
                self.record_result(session, CANCELLED_TOOL_RESULT.to_string()).await?;
                return Err(ReelError::Cancelled);
            }
            result = invoke(tool, args, &ctx) => result?,
        };

        self.record_result(session, normalize_result(&result)).await?;
        Ok(result)
    }

    async fn record_result(&self, session: &SessionContext, text: String) -> Result<(), ReelError> {
        self.memory
            .append(MemoryRecord::text(
                &session.session_id,
                &session.user_id,
                MemoryRole::ToolResult,
                text,
            ))
            .await
    }
}

impl std::fmt::Debug for ToolExecutionContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExecutionContract")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}
