//! One conversational session and its turn protocol.
//!
//! A turn moves through RECEIVED → HYDRATED → REASONING and ends COMPLETED,
//! CANCELLED or FAILED. Whatever happens, the caller gets one string back and
//! the user gets exactly one final notification.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::hydrate::{hydrate, trim_to_window};
use crate::agent_loop::{LoopInput, ReasoningLoop, ReasoningTrace, TurnOutcome};
use crate::config::{AgentSettings, LlmSettings};
use crate::error::ReelError;
use crate::memory::ConversationMemory;
use crate::notify::Notifier;
use crate::provider::ReasoningEngine;
use crate::stream::StreamingSink;
use crate::tools::{ToolCatalog, ToolExecutionContract};
use crate::types::{MemoryRecord, MemoryRole, ModelMessage, Notification, SessionContext};

/// Sent when a turn completes without producing any text. Never persisted.
pub const FALLBACK_REPLY: &str = "Sorry, I could not generate a reply.";

/// Prefix of the message sent when a turn fails.
pub const ERROR_REPLY_PREFIX: &str = "An error occurred while processing the message";

/// Collaborators a session is wired with.
#[derive(Clone)]
pub struct SessionParts {
    pub engine: Arc<dyn ReasoningEngine>,
    pub catalog: ToolCatalog,
    pub memory: Arc<dyn ConversationMemory>,
    pub notifier: Arc<dyn Notifier>,
}

/// Live state of one session id.
///
/// Turns are serialized: the history cache doubles as the turn lock, so a
/// second turn for the same session waits until the first has dispatched its
/// reply.
pub struct AgentSession {
    context: RwLock<SessionContext>,
    history: Mutex<Option<Vec<ModelMessage>>>,
    sink: Arc<StreamingSink>,
    memory: Arc<dyn ConversationMemory>,
    notifier: Arc<dyn Notifier>,
    catalog: ToolCatalog,
    contract: ToolExecutionContract,
    reasoning: ReasoningLoop,
    settings: AgentSettings,
    active: StdMutex<Option<CancellationToken>>,
}

impl AgentSession {
    pub fn new(
        context: SessionContext,
        parts: SessionParts,
        llm: &LlmSettings,
        settings: AgentSettings,
    ) -> Self {
        let sink = Arc::new(StreamingSink::new());
        let contract = ToolExecutionContract::new(sink.clone(), parts.memory.clone(), parts.notifier.clone())
            .with_title(settings.reply_title.clone());
        let reasoning =
            ReasoningLoop::new(parts.engine, llm.max_iterations).with_temperature(llm.temperature);
        Self {
            context: RwLock::new(context),
            history: Mutex::new(None),
            sink,
            memory: parts.memory,
            notifier: parts.notifier,
            catalog: parts.catalog,
            contract,
            reasoning,
            settings,
            active: StdMutex::new(None),
        }
    }

    /// Snapshot of the current session metadata.
    pub async fn context(&self) -> SessionContext {
        self.context.read().await.clone()
    }

    /// Refresh mutable metadata; see [`SessionContext::refresh`].
    pub async fn refresh(
        &self,
        user_id: &str,
        channel: Option<&str>,
        source: Option<&str>,
        username: Option<&str>,
    ) {
        self.context
            .write()
            .await
            .refresh(user_id, channel, source, username);
    }

    pub fn sink(&self) -> &Arc<StreamingSink> {
        &self.sink
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Number of messages currently held in the hydrated-history cache.
    ///
    /// `None` until the first turn hydrates.
    pub async fn cached_history_len(&self) -> Option<usize> {
        self.history.lock().await.as_ref().map(Vec::len)
    }

    /// Whether a turn is currently reasoning.
    pub fn is_busy(&self) -> bool {
        self.active_slot().is_some()
    }

    /// Cancel the in-flight turn, if any. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        match self.active_slot().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel any in-flight turn and drop pending output.
    pub async fn teardown(&self) {
        self.cancel();
        let dropped = self.sink.take().await;
        let ctx = self.context.read().await;
        debug!(
            session_id = %ctx.session_id,
            dropped_len = dropped.len(),
            "agent session torn down"
        );
    }

    /// Run one turn for `text` and return the reply sent to the user.
    ///
    /// Never fails: errors are reported to the user and returned as text.
    pub async fn process_message(&self, text: &str) -> String {
        let mut history = self.history.lock().await;
        let session = self.context().await;
        info!(
            session_id = %session.session_id,
            user_id = %session.user_id,
            state = "received",
            "turn started"
        );

        match self.run_turn(&session, text, &mut history).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    session_id = %session.session_id,
                    user_id = %session.user_id,
                    state = "failed",
                    error = %e,
                    "turn failed"
                );
                let message = format!("{ERROR_REPLY_PREFIX}: {e}");
                if let Err(dispatch) = self.dispatch(&session, &message).await {
                    warn!(session_id = %session.session_id, error = %dispatch, "error reply not delivered");
                }
                message
            }
        }
    }

    async fn run_turn(
        &self,
        session: &SessionContext,
        text: &str,
        history: &mut Option<Vec<ModelMessage>>,
    ) -> Result<String, ReelError> {
        self.memory
            .append(MemoryRecord::text(
                &session.session_id,
                &session.user_id,
                MemoryRole::User,
                text,
            ))
            .await?;

        let window = self.settings.memory_window;
        match history.as_mut() {
            Some(cache) => cache.push(ModelMessage::user(text)),
            None => {
                let records = self
                    .memory
                    .recent(&session.session_id, &session.user_id, window)
                    .await?;
                *history = Some(hydrate(&records));
            }
        }
        let cache = history.get_or_insert_with(Vec::new);
        debug!(
            session_id = %session.session_id,
            state = "hydrated",
            history = cache.len(),
            "history ready"
        );

        let mut messages = Vec::with_capacity(cache.len() + 1);
        messages.push(ModelMessage::system(
            self.settings.system_prompt_for(session.channel.as_deref()),
        ));
        messages.extend(cache.iter().cloned());

        let cancel = CancellationToken::new();
        *self.active_slot() = Some(cancel.clone());
        debug!(session_id = %session.session_id, state = "reasoning", "reasoning started");
        let outcome = self
            .reasoning
            .run(LoopInput {
                messages,
                catalog: &self.catalog,
                contract: &self.contract,
                session,
                sink: &self.sink,
                cancel: &cancel,
            })
            .await;
        *self.active_slot() = None;

        let trace = match outcome {
            TurnOutcome::Completed(trace) => {
                info!(
                    session_id = %session.session_id,
                    state = "completed",
                    iterations = trace.iterations,
                    tool_calls = trace.steps.len(),
                    stopped_early = trace.stopped_early,
                    "reasoning finished"
                );
                trace
            }
            TurnOutcome::Cancelled => {
                info!(session_id = %session.session_id, state = "cancelled", "reasoning cancelled");
                ReasoningTrace::default()
            }
            TurnOutcome::Failed(reason) => return Err(ReelError::Reasoning(reason)),
        };

        let usage = trace.usage;
        info!(
            session_id = %session.session_id,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            total_tokens = usage.total_tokens,
            "turn usage"
        );
        cache.extend(trace.messages);
        trim_to_window(cache, window);

        let reply = self.sink.take().await;
        if reply.is_empty() {
            self.dispatch(session, FALLBACK_REPLY).await?;
            return Ok(FALLBACK_REPLY.to_string());
        }
        self.dispatch(session, &reply).await?;
        self.memory
            .append(MemoryRecord::text(
                &session.session_id,
                &session.user_id,
                MemoryRole::Agent,
                reply.clone(),
            ))
            .await?;
        Ok(reply)
    }

    async fn dispatch(&self, session: &SessionContext, text: &str) -> Result<(), ReelError> {
        self.notifier
            .post(Notification::to_session(
                session,
                Some(&self.settings.reply_title),
                text,
            ))
            .await
    }

    fn active_slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("catalog", &self.catalog)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
