//! Shared test helpers: scripted engine, recording notifier, flaky memory.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use reel::agent::SessionRegistry;
use reel::config::{LlmSettings, ReelConfig};
use reel::error::ReelError;
use reel::memory::{ConversationMemory, InMemoryConversationMemory};
use reel::notify::Notifier;
use reel::provider::{EngineFactory, EngineRequest, EngineResponse, ReasoningEngine};
use reel::stream::StreamingSink;
use reel::tools::builtin::InMemoryMediaLibrary;
use reel::tools::CatalogSources;
use reel::types::*;

/// One scripted model call.
pub enum Step {
    /// Push `chunks` into the sink, then return them with `calls`.
    Reply {
        chunks: Vec<String>,
        calls: Vec<AgentToolCall>,
    },
    Fail(String),
    /// Never returns; only cancellation ends it.
    Hang,
}

impl Step {
    pub fn text(text: &str) -> Self {
        Self::Reply {
            chunks: vec![text.to_string()],
            calls: vec![],
        }
    }

    pub fn chunks(chunks: &[&str]) -> Self {
        Self::Reply {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            calls: vec![],
        }
    }

    pub fn tool(name: &str, arguments: serde_json::Value) -> Self {
        Self::text_then_tool("", name, arguments)
    }

    pub fn text_then_tool(text: &str, name: &str, arguments: serde_json::Value) -> Self {
        Self::Reply {
            chunks: if text.is_empty() { vec![] } else { vec![text.to_string()] },
            calls: vec![AgentToolCall {
                id: format!("call_{name}"),
                name: name.to_string(),
                arguments,
            }],
        }
    }
}

/// Engine that plays back queued steps. An exhausted script returns an empty
/// response.
#[derive(Default)]
pub struct ScriptedEngine {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<EngineRequest>>,
}

impl ScriptedEngine {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }

    pub fn requests(&self) -> Vec<EngineRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningEngine for ScriptedEngine {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: &EngineRequest,
        sink: &StreamingSink,
    ) -> Result<EngineResponse, ReelError> {
        self.requests.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            None => Ok(EngineResponse::default()),
            Some(Step::Fail(reason)) => Err(ReelError::api(500, reason)),
            Some(Step::Hang) => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
            Some(Step::Reply { chunks, calls }) => {
                for chunk in &chunks {
                    sink.push(chunk).await;
                }
                Ok(EngineResponse {
                    text: chunks.concat(),
                    tool_calls: calls,
                    usage: Usage {
                        input_tokens: 10,
                        output_tokens: 5,
                        total_tokens: 15,
                    },
                })
            }
        }
    }
}

/// Factory handing out one shared scripted engine.
pub struct ScriptedFactory {
    pub engine: Arc<ScriptedEngine>,
    pub created: Mutex<usize>,
}

impl ScriptedFactory {
    pub fn new(engine: Arc<ScriptedEngine>) -> Arc<Self> {
        Arc::new(Self {
            engine,
            created: Mutex::new(0),
        })
    }

    pub fn created(&self) -> usize {
        *self.created.lock().unwrap()
    }
}

impl EngineFactory for ScriptedFactory {
    fn create(&self, _settings: &LlmSettings) -> Result<Arc<dyn ReasoningEngine>, ReelError> {
        *self.created.lock().unwrap() += 1;
        Ok(self.engine.clone())
    }
}

/// Factory that always fails like a missing API key would.
pub struct MissingCredentials;

impl EngineFactory for MissingCredentials {
    fn create(&self, _settings: &LlmSettings) -> Result<Arc<dyn ReasoningEngine>, ReelError> {
        Err(ReelError::Configuration("missing API key for provider 'openai'".into()))
    }
}

/// Notifier that records every notification.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|n| n.text).collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn post(&self, notification: Notification) -> Result<(), ReelError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ReelError::Notify("channel unavailable".into()));
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// In-memory store that fails appends of one role.
pub struct FlakyMemory {
    pub inner: InMemoryConversationMemory,
    fail_role: Mutex<Option<MemoryRole>>,
}

impl FlakyMemory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryConversationMemory::default(),
            fail_role: Mutex::new(None),
        })
    }

    pub fn fail_appends_of(&self, role: Option<MemoryRole>) {
        *self.fail_role.lock().unwrap() = role;
    }
}

#[async_trait]
impl ConversationMemory for FlakyMemory {
    async fn append(&self, record: MemoryRecord) -> Result<(), ReelError> {
        if *self.fail_role.lock().unwrap() == Some(record.role) {
            return Err(ReelError::MemoryIo("disk full".into()));
        }
        self.inner.append(record).await
    }

    async fn recent(
        &self,
        session_id: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, ReelError> {
        self.inner.recent(session_id, user_id, limit).await
    }

    async fn clear(&self, session_id: &str, user_id: &str) -> Result<(), ReelError> {
        self.inner.clear(session_id, user_id).await
    }
}

pub fn sample_sources() -> CatalogSources {
    CatalogSources::new(Arc::new(InMemoryMediaLibrary::with_sample_catalog()))
}

/// Everything a registry test needs to inspect.
pub struct Harness {
    pub registry: SessionRegistry,
    pub engine: Arc<ScriptedEngine>,
    pub factory: Arc<ScriptedFactory>,
    pub notifier: Arc<RecordingNotifier>,
    pub memory: Arc<InMemoryConversationMemory>,
}

impl Harness {
    pub fn new(steps: Vec<Step>) -> Self {
        Self::with_config(steps, ReelConfig::default())
    }

    pub fn with_config(steps: Vec<Step>, config: ReelConfig) -> Self {
        Self::with_sources(steps, config, sample_sources())
    }

    pub fn with_sources(steps: Vec<Step>, config: ReelConfig, sources: CatalogSources) -> Self {
        let engine = ScriptedEngine::new(steps);
        let factory = ScriptedFactory::new(engine.clone());
        let notifier = RecordingNotifier::new();
        let memory = Arc::new(InMemoryConversationMemory::default());
        let registry = SessionRegistry::new(
            config,
            memory.clone(),
            notifier.clone(),
            factory.clone(),
            sources,
        );
        Self {
            registry,
            engine,
            factory,
            notifier,
            memory,
        }
    }

    pub async fn roles(&self, session_id: &str, user_id: &str) -> Vec<MemoryRole> {
        self.memory
            .records(session_id, user_id)
            .await
            .iter()
            .map(|r| r.role)
            .collect()
    }

    pub async fn turn(&self, session_id: &str, user_id: &str, text: &str) -> String {
        self.registry
            .process_message(session_id, user_id, text, Some("telegram"), None, None)
            .await
            .expect("session construction")
    }
}
