//! Agent sessions: per-session turn protocol and the session registry.

pub mod hydrate;
pub mod registry;
pub mod session;

pub use hydrate::hydrate;
pub use registry::SessionRegistry;
pub use session::{AgentSession, SessionParts, ERROR_REPLY_PREFIX, FALLBACK_REPLY};
