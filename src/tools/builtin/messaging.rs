//! `send_message`: push a message straight to the user's channel.

use std::sync::Arc;

use tracing::{error, info};

use crate::tools::tool::{AgentTool, Tool, ToolExecutionContext};
use crate::tools::types::AgentToolParameters;

const DEFAULT_MESSAGE_TYPE: &str = "info";

/// Create the `send_message` tool.
///
/// The message type becomes the notification title.
pub fn send_message_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        "send_message",
        "Send a notification to the user, such as the outcome of an operation or other important information.",
        AgentToolParameters::object()
            .string("message", "Text to send to the user", true)
            .explanation()
            .string_with_default(
                "message_type",
                "Kind of message, used as its title (info, success, warning, error)",
                DEFAULT_MESSAGE_TYPE,
            )
            .build(),
        |args, ctx: ToolExecutionContext| async move {
            let message = args.get_str("message")?;
            let message_type = args.get_str_opt("message_type").unwrap_or(DEFAULT_MESSAGE_TYPE);
            info!(tool = "send_message", message_type, "sending message");

            let reply = match ctx.notify(Some(message_type), message).await {
                Ok(()) => "Message sent.".to_string(),
                Err(e) => {
                    error!(tool = "send_message", error = %e, "message dispatch failed");
                    format!("Failed to send message: {e}")
                }
            };
            Ok(serde_json::Value::String(reply))
        },
    ))
}
