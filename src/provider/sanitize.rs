//! Transcript repair before a provider call.
//!
//! Chat Completions APIs reject an assistant message carrying tool calls
//! unless every call is answered by a `tool` message right after it. Replayed
//! memory renders results as plain assistant text, so unanswered calls are
//! paired here: a directly following plain assistant message becomes the
//! result, otherwise a synthetic error result is inserted.

use std::collections::{HashMap, HashSet};

use crate::types::{ContentPart, ModelMessage, Role};

pub fn sanitize_tool_pairing(messages: &[ModelMessage]) -> Vec<ModelMessage> {
    let mut out: Vec<ModelMessage> = Vec::with_capacity(messages.len());
    let mut seen_tool_results: HashSet<String> = HashSet::new();

    let mut i = 0usize;
    while i < messages.len() {
        let msg = &messages[i];
        if msg.role == Role::Tool {
            // Orphaned result without a preceding call.
            i += 1;
            continue;
        }
        let tool_calls = msg.tool_calls();
        if msg.role != Role::Assistant || tool_calls.is_empty() {
            out.push(msg.clone());
            i += 1;
            continue;
        }

        let call_ids: HashSet<&str> = tool_calls.iter().map(|tc| tc.id.as_str()).collect();
        let mut span_results: HashMap<String, ModelMessage> = HashMap::new();
        let mut j = i + 1;
        while j < messages.len() && messages[j].role == Role::Tool {
            if let Some(id) = tool_result_id(&messages[j]) {
                if call_ids.contains(id.as_str()) && !seen_tool_results.contains(&id) {
                    seen_tool_results.insert(id.clone());
                    span_results.insert(id, messages[j].clone());
                }
            }
            j += 1;
        }

        out.push(msg.clone());
        for call in tool_calls {
            if let Some(existing) = span_results.remove(&call.id) {
                out.push(existing);
                continue;
            }
            let replayed = messages
                .get(j)
                .filter(|next| next.role == Role::Assistant && next.tool_calls().is_empty());
            match replayed {
                Some(next) => {
                    out.push(ModelMessage::tool_result(
                        call.id.clone(),
                        serde_json::Value::String(next.text()),
                        false,
                    ));
                    j += 1;
                }
                None => out.push(ModelMessage::tool_result(
                    call.id.clone(),
                    serde_json::json!({ "error": "tool result missing from transcript" }),
                    true,
                )),
            }
        }
        i = j;
    }

    out
}

fn tool_result_id(message: &ModelMessage) -> Option<String> {
    message.content.iter().find_map(|part| match part {
        ContentPart::ToolResult(result) => Some(result.tool_call_id.clone()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentToolCall;
    use serde_json::json;

    fn call(id: &str) -> ModelMessage {
        ModelMessage::assistant_tool_calls(
            "",
            vec![AgentToolCall {
                id: id.into(),
                name: id.into(),
                arguments: json!({}),
            }],
        )
    }

    #[test]
    fn replayed_result_text_becomes_tool_message() {
        let messages = vec![
            ModelMessage::user("search The Matrix"),
            call("search_media"),
            ModelMessage::assistant("[{\"title\":\"The Matrix\"}]"),
            ModelMessage::assistant("Found it."),
        ];

        let out = sanitize_tool_pairing(&messages);

        let roles: Vec<_> = out.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
        assert_eq!(tool_result_id(&out[2]).as_deref(), Some("search_media"));
        assert_eq!(out[3].text(), "Found it.");
    }

    #[test]
    fn live_tool_results_are_kept() {
        let messages = vec![
            call("c1"),
            ModelMessage::tool_result("c1", json!("ok"), false),
            ModelMessage::assistant("done"),
        ];

        assert_eq!(sanitize_tool_pairing(&messages), messages);
    }

    #[test]
    fn unanswered_call_gets_synthetic_error() {
        let messages = vec![call("c1"), ModelMessage::user("next")];

        let out = sanitize_tool_pairing(&messages);

        assert_eq!(out.len(), 3);
        assert!(matches!(
            &out[1].content[0],
            ContentPart::ToolResult(r) if r.is_error && r.tool_call_id == "c1"
        ));
    }

    #[test]
    fn orphan_tool_results_are_dropped() {
        let messages = vec![
            ModelMessage::tool_result("ghost", json!("x"), false),
            ModelMessage::user("hi"),
        ];

        let out = sanitize_tool_pairing(&messages);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].role, Role::User);
    }
}
