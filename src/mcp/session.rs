//! Protocol sessions of the MCP gateway.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use strum::Display;
use tokio::time::Instant;
use uuid::Uuid;

use crate::tools::ToolCatalog;

/// Handshake state of one protocol session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum McpSessionState {
    Uninitialized,
    /// `initialize` answered; waiting for `notifications/initialized`.
    Negotiated,
    Ready,
    Terminated,
}

#[derive(Debug, Clone)]
pub struct McpSession {
    pub id: String,
    pub user_id: String,
    pub state: McpSessionState,
    pub protocol_version: Option<String>,
    pub client_capabilities: Value,
    pub client_info: Value,
    pub created_at: DateTime<Utc>,
    last_activity: Instant,
    catalog: Option<ToolCatalog>,
}

impl McpSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            state: McpSessionState::Uninitialized,
            protocol_version: None,
            client_capabilities: Value::Null,
            client_info: Value::Null,
            created_at: Utc::now(),
            last_activity: Instant::now(),
            catalog: None,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    pub fn is_expired(&self, idle_timeout: Option<Duration>) -> bool {
        idle_timeout.is_some_and(|limit| self.idle_for() >= limit)
    }

    /// Record the outcome of `initialize`.
    pub fn negotiate(&mut self, version: impl Into<String>, capabilities: Value, client_info: Value) {
        self.protocol_version = Some(version.into());
        self.client_capabilities = capabilities;
        self.client_info = client_info;
        self.state = McpSessionState::Negotiated;
    }

    /// Complete the handshake. Returns `false` unless the session was negotiated.
    pub fn mark_ready(&mut self) -> bool {
        match self.state {
            McpSessionState::Negotiated => {
                self.state = McpSessionState::Ready;
                true
            }
            McpSessionState::Ready => true,
            McpSessionState::Uninitialized | McpSessionState::Terminated => false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == McpSessionState::Ready
    }

    pub fn terminate(&mut self) {
        self.state = McpSessionState::Terminated;
        self.catalog = None;
    }

    pub fn catalog(&self) -> Option<&ToolCatalog> {
        self.catalog.as_ref()
    }

    pub fn cache_catalog(&mut self, catalog: ToolCatalog) {
        self.catalog = Some(catalog);
    }
}
