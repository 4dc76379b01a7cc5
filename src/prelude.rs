//! Convenience re-exports for common use.

pub use crate::agent::{AgentSession, SessionRegistry};
pub use crate::config::ReelConfig;
pub use crate::error::{ReelError, Result};
pub use crate::memory::{ConversationMemory, InMemoryConversationMemory};
pub use crate::notify::{LogNotifier, Notifier};
pub use crate::provider::{EngineFactory, ReasoningEngine};
pub use crate::stream::StreamingSink;
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolArguments, ToolCatalog};
pub use crate::types::{MemoryRecord, MemoryRole, ModelMessage, Notification, Role, SessionContext, Usage};
