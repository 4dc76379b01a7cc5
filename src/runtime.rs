//! Process-scoped context owning the registry, the gateway and their
//! collaborators.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::agent::SessionRegistry;
use crate::config::ReelConfig;
use crate::error::ReelError;
use crate::mcp::McpGateway;
use crate::memory::ConversationMemory;
use crate::notify::Notifier;
use crate::provider::EngineFactory;
use crate::tools::CatalogSources;

/// Everything a [`Runtime`] is assembled from.
pub struct RuntimeParts {
    pub memory: Arc<dyn ConversationMemory>,
    pub notifier: Arc<dyn Notifier>,
    pub engines: Arc<dyn EngineFactory>,
    pub sources: CatalogSources,
}

impl RuntimeParts {
    /// In-process memory, log notifier, the bundled engine and a sample
    /// media library.
    #[cfg(feature = "openai")]
    pub fn local() -> Self {
        use crate::memory::InMemoryConversationMemory;
        use crate::notify::LogNotifier;
        use crate::provider::openai::OpenAiEngineFactory;
        use crate::tools::builtin::InMemoryMediaLibrary;

        Self {
            memory: Arc::new(InMemoryConversationMemory::default()),
            notifier: Arc::new(LogNotifier),
            engines: Arc::new(OpenAiEngineFactory),
            sources: CatalogSources::new(Arc::new(InMemoryMediaLibrary::with_sample_catalog())),
        }
    }
}

pub struct Runtime {
    config: ReelConfig,
    registry: SessionRegistry,
    gateway: Arc<McpGateway>,
    memory: Arc<dyn ConversationMemory>,
    shutdown: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Runtime {
    /// Assemble the runtime and start background tasks.
    ///
    /// Must be called inside a tokio runtime.
    pub fn init(config: ReelConfig, parts: RuntimeParts) -> Arc<Self> {
        let RuntimeParts {
            memory,
            notifier,
            engines,
            sources,
        } = parts;

        let gateway = Arc::new(
            McpGateway::new(sources.clone(), config.mcp.clone()).with_notifier(notifier.clone()),
        );
        let registry = SessionRegistry::new(config.clone(), memory.clone(), notifier, engines, sources);
        let shutdown = CancellationToken::new();
        let sweeper = gateway.spawn_sweeper(shutdown.child_token());

        info!(
            provider = %config.llm.provider,
            model = %config.llm.model,
            mcp_idle_secs = config.mcp.session_idle_secs,
            "runtime initialized"
        );
        Arc::new(Self {
            config,
            registry,
            gateway,
            memory,
            shutdown,
            sweeper: Mutex::new(sweeper),
        })
    }

    pub fn config(&self) -> &ReelConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn gateway(&self) -> &Arc<McpGateway> {
        &self.gateway
    }

    pub fn memory(&self) -> &Arc<dyn ConversationMemory> {
        &self.memory
    }

    /// Cancelled when [`Runtime::shutdown`] starts.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run one turn; see [`SessionRegistry::process_message`].
    pub async fn process_message(
        &self,
        session_id: &str,
        user_id: &str,
        text: &str,
        channel: Option<&str>,
        source: Option<&str>,
        username: Option<&str>,
    ) -> Result<String, ReelError> {
        self.registry
            .process_message(session_id, user_id, text, channel, source, username)
            .await
    }

    #[cfg(feature = "http")]
    pub fn mcp_router(&self) -> axum::Router {
        crate::mcp::http::router(self.gateway.clone())
    }

    /// Stop background tasks and drop every live session.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        if let Some(handle) = self.sweeper.lock().await.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "MCP sweeper ended abnormally");
            }
        }
        self.registry.shutdown().await;
        self.gateway.shutdown().await;
        info!("runtime shut down");
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}
