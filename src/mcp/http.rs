//! HTTP transport: `POST`/`DELETE /mcp` plus a small REST mirror of the catalog.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::gateway::{McpGateway, SESSION_HEADER, USER_HEADER};

pub const MCP_ROUTE: &str = "/mcp";

/// Router serving the gateway.
pub fn router(gateway: Arc<McpGateway>) -> Router {
    Router::new()
        .route(MCP_ROUTE, post(post_mcp).delete(delete_mcp))
        .route("/tools", get(list_tools))
        .route("/tools/call", post(call_tool))
        .route("/tools/{name}", get(describe_tool))
        .route("/tools/{name}/schema", get(tool_schema))
        .with_state(gateway)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

async fn post_mcp(
    State(gateway): State<Arc<McpGateway>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let outcome = gateway
        .handle(header(&headers, SESSION_HEADER), header(&headers, USER_HEADER), &body)
        .await;

    let mut response = match outcome.body {
        Some(body) => (StatusCode::OK, Json(body)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };
    if let Some(sid) = outcome.session_id {
        match HeaderValue::from_str(&sid) {
            Ok(value) => {
                response.headers_mut().insert(SESSION_HEADER, value);
            }
            Err(e) => warn!(error = %e, "session id is not a valid header value"),
        }
    }
    response
}

async fn delete_mcp(State(gateway): State<Arc<McpGateway>>, headers: HeaderMap) -> StatusCode {
    match header(&headers, SESSION_HEADER) {
        Some(sid) if gateway.delete(sid).await => StatusCode::NO_CONTENT,
        _ => StatusCode::NOT_FOUND,
    }
}

async fn list_tools(State(gateway): State<Arc<McpGateway>>) -> Json<Value> {
    Json(json!(gateway.list_tools().await))
}

async fn describe_tool(
    State(gateway): State<Arc<McpGateway>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let descriptor = gateway.describe_tool(&name).await.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!(descriptor)))
}

async fn tool_schema(
    State(gateway): State<Arc<McpGateway>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let descriptor = gateway.describe_tool(&name).await.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(descriptor.input_schema))
}

#[derive(Debug, Deserialize)]
struct CallToolBody {
    tool_name: String,
    #[serde(default)]
    arguments: Value,
}

async fn call_tool(
    State(gateway): State<Arc<McpGateway>>,
    Json(body): Json<CallToolBody>,
) -> Json<Value> {
    match gateway.call_tool(&body.tool_name, body.arguments).await {
        Ok(result) => Json(json!({ "success": true, "result": result })),
        Err(e) => Json(json!({ "success": false, "error": e.to_string() })),
    }
}
