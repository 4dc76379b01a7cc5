//! JSON-RPC dispatcher exposing the tool catalog to MCP clients.
//!
//! The gateway keeps its own session map, unrelated to agent sessions. A
//! client must `initialize` (which creates a session and returns its id via
//! the `mcp-session-id` header), then send `notifications/initialized` before
//! any other method is served.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use tokio::sync::{OnceCell, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::protocol::{codes, tool_result_envelope, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use super::session::McpSession;
use crate::config::McpSettings;
use crate::error::ReelError;
use crate::notify::Notifier;
use crate::tools::{CatalogSources, ToolCatalog, ToolDescriptor, ToolExecutionContext};
use crate::types::SessionContext;

pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

pub const SESSION_HEADER: &str = "mcp-session-id";
pub const USER_HEADER: &str = "x-reel-user";

/// Channel recorded on tool calls made through the gateway.
const MCP_CHANNEL: &str = "mcp";

/// Outcome of one POST.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    /// Session id to return in the `mcp-session-id` header.
    pub session_id: Option<String>,
    /// `None` for accepted notifications.
    pub body: Option<Value>,
}

impl GatewayResponse {
    fn reply(session_id: Option<String>, response: JsonRpcResponse) -> Self {
        Self {
            session_id,
            body: Some(response.into_value()),
        }
    }

    fn accepted(session_id: Option<String>) -> Self {
        Self {
            session_id,
            body: None,
        }
    }
}

/// Pick the protocol version for a client request.
///
/// A supported version is adopted as is; anything else falls back to the
/// latest version.
pub fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().copied().find(|s| *s == v))
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

pub struct McpGateway {
    sessions: RwLock<HashMap<String, McpSession>>,
    sources: CatalogSources,
    settings: McpSettings,
    notifier: Option<Arc<dyn Notifier>>,
    rest_catalog: OnceCell<ToolCatalog>,
}

impl McpGateway {
    pub fn new(sources: CatalogSources, settings: McpSettings) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            sources,
            settings,
            notifier: None,
            rest_catalog: OnceCell::new(),
        }
    }

    /// Notifier handed to tools invoked through the gateway.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn settings(&self) -> &McpSettings {
        &self.settings
    }

    /// Handle one POSTed JSON-RPC message.
    pub async fn handle(
        &self,
        session_header: Option<&str>,
        user_header: Option<&str>,
        body: &[u8],
    ) -> GatewayResponse {
        self.sweep_expired().await;
        let session_id = session_header.map(str::to_string);

        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "unparseable MCP request");
                return GatewayResponse::reply(
                    session_id,
                    JsonRpcResponse::error(
                        Value::Null,
                        JsonRpcError::new(codes::PARSE_ERROR, format!("parse error: {e}")),
                    ),
                );
            }
        };
        let request = match JsonRpcRequest::from_value(value) {
            Ok(request) => request,
            Err((id, error)) => {
                return GatewayResponse::reply(session_id, JsonRpcResponse::error(id, error))
            }
        };

        if request.is_notification() {
            self.handle_notification(session_header, &request).await;
            return GatewayResponse::accepted(session_id);
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        let (session_id, outcome) = match request.method.as_str() {
            "initialize" => match self.initialize(session_header, user_header, &request).await {
                Ok((sid, result)) => (Some(sid), Ok(result)),
                Err(e) => (session_id, Err(e)),
            },
            "ping" => {
                if let Some(sid) = session_header {
                    self.touch(sid).await;
                }
                (session_id, Ok(json!({})))
            }
            "notifications/initialized" => (
                session_id,
                Err(JsonRpcError::new(
                    codes::INVALID_REQUEST,
                    "notifications/initialized must be sent as a notification",
                )),
            ),
            "tools/list" => (session_id, self.tools_list(session_header).await),
            "tools/call" => (session_id, self.tools_call(session_header, &request).await),
            other => {
                debug!(method = other, "unknown MCP method");
                (
                    session_id,
                    Err(JsonRpcError::new(
                        codes::METHOD_NOT_FOUND,
                        format!("method not found: {other}"),
                    )),
                )
            }
        };

        let response = match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        };
        GatewayResponse::reply(session_id, response)
    }

    async fn initialize(
        &self,
        session_header: Option<&str>,
        user_header: Option<&str>,
        request: &JsonRpcRequest,
    ) -> Result<(String, Value), JsonRpcError> {
        let params = request.params_object()?;
        let requested = match params.get("protocolVersion") {
            None | Some(Value::Null) => None,
            Some(Value::String(v)) => Some(v.as_str()),
            Some(_) => {
                return Err(JsonRpcError::new(
                    codes::INVALID_PARAMS,
                    "protocolVersion must be a string",
                ))
            }
        };
        let version = negotiate_version(requested);
        if requested != Some(version) {
            warn!(
                requested = requested.unwrap_or("<none>"),
                adopted = version,
                "MCP protocol version mismatch; using server default"
            );
        }
        let capabilities = params.get("capabilities").cloned().unwrap_or_else(|| json!({}));
        let client_info = params.get("clientInfo").cloned().unwrap_or(Value::Null);

        let mut sessions = self.sessions.write().await;
        let session = match session_header {
            Some(sid) => sessions.get_mut(sid).ok_or_else(|| unknown_session(Some(sid)))?,
            None => {
                let user = user_header
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .unwrap_or(self.settings.default_user.as_str());
                let session = McpSession::new(user);
                let sid = session.id.clone();
                info!(session_id = %sid, user_id = user, "MCP session created");
                sessions.entry(sid).or_insert(session)
            }
        };
        session.negotiate(version, capabilities, client_info);
        session.touch();
        debug!(session_id = %session.id, protocol_version = version, "MCP session negotiated");

        Ok((
            session.id.clone(),
            json!({
                "protocolVersion": version,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        ))
    }

    async fn handle_notification(&self, session_header: Option<&str>, request: &JsonRpcRequest) {
        if request.method != "notifications/initialized" {
            debug!(method = %request.method, "ignoring MCP notification");
            return;
        }
        let mut sessions = self.sessions.write().await;
        match session_header.and_then(|sid| sessions.get_mut(sid)) {
            Some(session) => {
                session.touch();
                if session.mark_ready() {
                    info!(session_id = %session.id, "MCP session ready");
                } else {
                    warn!(session_id = %session.id, state = %session.state, "initialized before initialize");
                }
            }
            None => warn!(session_id = session_header.unwrap_or("<none>"), "initialized for unknown MCP session"),
        }
    }

    /// Resolve a ready session and return its user and catalog.
    async fn ready_session(&self, session_header: Option<&str>) -> Result<(String, String, ToolCatalog), JsonRpcError> {
        let sid = session_header.ok_or_else(|| unknown_session(None))?;
        let (user_id, cached) = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(sid).ok_or_else(|| unknown_session(Some(sid)))?;
            if !session.is_ready() {
                return Err(JsonRpcError::new(
                    codes::SESSION_NOT_READY,
                    format!("session {sid} is {}; send notifications/initialized first", session.state),
                ));
            }
            session.touch();
            (session.user_id.clone(), session.catalog().cloned())
        };

        let catalog = match cached {
            Some(catalog) => catalog,
            None => {
                let catalog = self.sources.build().await;
                if let Some(session) = self.sessions.write().await.get_mut(sid) {
                    session.cache_catalog(catalog.clone());
                }
                catalog
            }
        };
        Ok((sid.to_string(), user_id, catalog))
    }

    async fn tools_list(&self, session_header: Option<&str>) -> Result<Value, JsonRpcError> {
        let (_, _, catalog) = self.ready_session(session_header).await?;
        let tools = serde_json::to_value(catalog.list()).map_err(|e| JsonRpcError::internal(e.to_string()))?;
        Ok(json!({ "tools": tools }))
    }

    async fn tools_call(
        &self,
        session_header: Option<&str>,
        request: &JsonRpcRequest,
    ) -> Result<Value, JsonRpcError> {
        let (sid, user_id, catalog) = self.ready_session(session_header).await?;
        let params = request.params_object()?;
        let (name, arguments) = call_params(&params)?;

        let ctx = self.tool_context(SessionContext::new(sid.as_str(), user_id).with_channel(MCP_CHANNEL));
        match catalog.call(name, arguments, &ctx).await {
            Ok(text) => Ok(tool_result_envelope(text, false)),
            Err(e) => {
                warn!(session_id = %sid, tool = name, error = %e, "MCP tool call failed");
                Ok(tool_result_envelope(e.to_string(), true))
            }
        }
    }

    fn tool_context(&self, session: SessionContext) -> ToolExecutionContext {
        let ctx = ToolExecutionContext::new(session);
        match &self.notifier {
            Some(notifier) => ctx.with_notifier(notifier.clone()),
            None => ctx,
        }
    }

    async fn touch(&self, sid: &str) {
        if let Some(session) = self.sessions.write().await.get_mut(sid) {
            session.touch();
        }
    }

    /// Terminate a session. Returns whether it existed.
    pub async fn delete(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(mut session) => {
                session.terminate();
                info!(session_id, "MCP session deleted");
                true
            }
            None => false,
        }
    }

    /// Evict sessions idle for longer than the configured timeout.
    pub async fn sweep_expired(&self) -> usize {
        let Some(limit) = self.settings.idle_timeout() else {
            return 0;
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|sid, session| {
            let keep = !session.is_expired(Some(limit));
            if !keep {
                info!(session_id = %sid, idle_secs = session.idle_for().as_secs(), "MCP session expired");
            }
            keep
        });
        before - sessions.len()
    }

    /// Spawn a background task sweeping idle sessions until `cancel` fires.
    ///
    /// Returns `None` when idle eviction is disabled.
    pub fn spawn_sweeper(self: &Arc<Self>, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        let limit = self.settings.idle_timeout()?;
        let period = (limit / 2).max(Duration::from_secs(1));
        let gateway = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = gateway.sweep_expired().await;
                        if evicted > 0 {
                            debug!(evicted, "MCP sweeper evicted idle sessions");
                        }
                    }
                }
            }
        }))
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn session(&self, session_id: &str) -> Option<McpSession> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Drop every session.
    pub async fn shutdown(&self) {
        let mut sessions = self.sessions.write().await;
        for session in sessions.values_mut() {
            session.terminate();
        }
        let count = sessions.len();
        sessions.clear();
        info!(sessions = count, "MCP gateway shut down");
    }

    async fn shared_catalog(&self) -> &ToolCatalog {
        self.rest_catalog.get_or_init(|| self.sources.build()).await
    }

    /// Descriptors of every tool, for the REST mirror.
    pub async fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.shared_catalog().await.list()
    }

    pub async fn describe_tool(&self, name: &str) -> Option<ToolDescriptor> {
        self.list_tools().await.into_iter().find(|d| d.name == name)
    }

    /// Call a tool outside any protocol session, as the default user.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, ReelError> {
        let session = SessionContext::new("rest", self.settings.default_user.as_str()).with_channel(MCP_CHANNEL);
        let ctx = self.tool_context(session);
        self.shared_catalog().await.call(name, arguments, &ctx).await
    }
}

impl std::fmt::Debug for McpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpGateway")
            .field("settings", &self.settings)
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

fn unknown_session(sid: Option<&str>) -> JsonRpcError {
    match sid {
        Some(sid) => JsonRpcError::new(codes::UNKNOWN_SESSION, format!("unknown session: {sid}")),
        None => JsonRpcError::new(codes::UNKNOWN_SESSION, "missing mcp-session-id header"),
    }
}

fn call_params(params: &Map<String, Value>) -> Result<(&str, Value), JsonRpcError> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| JsonRpcError::new(codes::INVALID_PARAMS, "params.name must be a non-empty string"))?;
    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(args @ Value::Object(_)) => args.clone(),
        Some(_) => {
            return Err(JsonRpcError::new(
                codes::INVALID_PARAMS,
                "params.arguments must be an object",
            ))
        }
    };
    Ok((name, arguments))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_versions_are_adopted() {
        assert_eq!(negotiate_version(Some("2024-11-05")), "2024-11-05");
        assert_eq!(negotiate_version(Some("2025-03-26")), "2025-03-26");
        assert_eq!(negotiate_version(Some("1999-01-01")), LATEST_PROTOCOL_VERSION);
        assert_eq!(negotiate_version(None), LATEST_PROTOCOL_VERSION);
    }

    #[test]
    fn call_params_default_arguments_to_an_object() {
        let params = json!({ "name": "search_media" });
        let (name, args) = call_params(params.as_object().unwrap()).unwrap();
        assert_eq!(name, "search_media");
        assert_eq!(args, json!({}));

        let params = json!({ "name": "search_media", "arguments": "nope" });
        let err = call_params(params.as_object().unwrap()).unwrap_err();
        assert_eq!(err.code, codes::INVALID_PARAMS);

        let params = json!({ "arguments": {} });
        assert!(call_params(params.as_object().unwrap()).is_err());
    }
}
