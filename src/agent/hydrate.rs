//! Replay of persisted memory records as engine messages.

use crate::types::{AgentToolCall, MemoryRecord, MemoryRole, ModelMessage};

/// Map persisted records onto the two-party conversation, preserving order.
///
/// `user` records become user messages. A `tool_call` becomes an assistant
/// turn carrying the recorded call; `agent`, `tool_result` and `system`
/// become plain assistant text.
pub fn hydrate(records: &[MemoryRecord]) -> Vec<ModelMessage> {
    records.iter().map(to_message).collect()
}

fn to_message(record: &MemoryRecord) -> ModelMessage {
    match record.role {
        MemoryRole::User => ModelMessage::user(record.content_str()),
        MemoryRole::ToolCall => match &record.metadata {
            Some(meta) => ModelMessage::assistant_tool_calls(
                "",
                vec![AgentToolCall {
                    id: meta.call_id.clone(),
                    name: meta.tool_name.clone(),
                    arguments: meta.parameters.clone(),
                }],
            ),
            // A call record without metadata still keeps its slot.
            None => ModelMessage::assistant(record.content_str()),
        },
        MemoryRole::Agent | MemoryRole::ToolResult | MemoryRole::System => {
            ModelMessage::assistant(record.content_str())
        }
    }
}

/// Keep at most `window` of the most recent messages.
pub(crate) fn trim_to_window(messages: &mut Vec<ModelMessage>, window: usize) {
    if messages.len() > window {
        let overflow = messages.len() - window;
        messages.drain(..overflow);
    }
}
