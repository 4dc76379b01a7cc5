//! Session id → live [`AgentSession`] map.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::session::{AgentSession, SessionParts};
use crate::config::ReelConfig;
use crate::error::ReelError;
use crate::memory::ConversationMemory;
use crate::notify::Notifier;
use crate::provider::EngineFactory;
use crate::tools::CatalogSources;
use crate::types::SessionContext;

/// Owns at most one live [`AgentSession`] per session id.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<AgentSession>>>,
    memory: Arc<dyn ConversationMemory>,
    notifier: Arc<dyn Notifier>,
    engines: Arc<dyn EngineFactory>,
    sources: CatalogSources,
    config: ReelConfig,
}

impl SessionRegistry {
    pub fn new(
        config: ReelConfig,
        memory: Arc<dyn ConversationMemory>,
        notifier: Arc<dyn Notifier>,
        engines: Arc<dyn EngineFactory>,
        sources: CatalogSources,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            memory,
            notifier,
            engines,
            sources,
            config,
        }
    }

    /// Return the live session for `session_id`, creating it if needed.
    ///
    /// An existing session keeps its sink and history cache; only its
    /// metadata is refreshed. Creation fails with
    /// [`ReelError::Configuration`] when no engine can be built.
    pub async fn get_or_create(
        &self,
        session_id: &str,
        user_id: &str,
        channel: Option<&str>,
        source: Option<&str>,
        username: Option<&str>,
    ) -> Result<Arc<AgentSession>, ReelError> {
        let live = self.sessions.read().await.get(session_id).cloned();
        if let Some(existing) = live {
            existing.refresh(user_id, channel, source, username).await;
            return Ok(existing);
        }

        let mut sessions = self.sessions.write().await;
        // Another caller may have created it while we waited for the lock.
        if let Some(existing) = sessions.get(session_id).cloned() {
            drop(sessions);
            existing.refresh(user_id, channel, source, username).await;
            return Ok(existing);
        }

        let engine = self.engines.create(&self.config.llm)?;
        let mut context = SessionContext::new(session_id, user_id);
        context.refresh(user_id, channel, source, username);
        let session = Arc::new(AgentSession::new(
            context,
            SessionParts {
                engine,
                catalog: self.sources.build().await,
                memory: self.memory.clone(),
                notifier: self.notifier.clone(),
            },
            &self.config.llm,
            self.config.agent.clone(),
        ));
        sessions.insert(session_id.to_string(), session.clone());
        info!(session_id, user_id, live_sessions = sessions.len(), "agent session created");
        Ok(session)
    }

    /// Run one turn and return the reply.
    ///
    /// Only session construction can fail; the turn itself always yields text.
    pub async fn process_message(
        &self,
        session_id: &str,
        user_id: &str,
        text: &str,
        channel: Option<&str>,
        source: Option<&str>,
        username: Option<&str>,
    ) -> Result<String, ReelError> {
        let session = self
            .get_or_create(session_id, user_id, channel, source, username)
            .await?;
        Ok(session.process_message(text).await)
    }

    /// Tear down the live session and purge its memory for `user_id`.
    pub async fn clear_session(&self, session_id: &str, user_id: &str) -> Result<(), ReelError> {
        let removed = self.sessions.write().await.remove(session_id);
        if let Some(session) = &removed {
            session.teardown().await;
        }
        self.memory.clear(session_id, user_id).await?;
        info!(session_id, user_id, was_live = removed.is_some(), "session cleared");
        Ok(())
    }

    /// Cancel the in-flight turn of a session. Returns whether one was running.
    pub async fn cancel(&self, session_id: &str) -> bool {
        let cancelled = self
            .sessions
            .read()
            .await
            .get(session_id)
            .is_some_and(|session| session.cancel());
        debug!(session_id, cancelled, "cancel requested");
        cancelled
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<AgentSession>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub fn config(&self) -> &ReelConfig {
        &self.config
    }

    /// Tear down every live session. Memory is left intact.
    pub async fn shutdown(&self) {
        let drained: Vec<_> = self.sessions.write().await.drain().collect();
        for (_, session) in &drained {
            session.teardown().await;
        }
        info!(sessions = drained.len(), "session registry shut down");
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}
