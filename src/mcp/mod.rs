//! MCP gateway: the tool catalog over JSON-RPC 2.0.

pub mod gateway;
pub mod protocol;
pub mod session;

#[cfg(feature = "http")]
pub mod http;

pub use gateway::{
    negotiate_version, GatewayResponse, McpGateway, LATEST_PROTOCOL_VERSION, SESSION_HEADER,
    SUPPORTED_PROTOCOL_VERSIONS, USER_HEADER,
};
pub use protocol::{codes, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use session::{McpSession, McpSessionState};
