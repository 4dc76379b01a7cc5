//! Tests for core types.

use pretty_assertions::assert_eq;
use reel::types::*;
use serde_json::json;

#[test]
fn model_message_constructors() {
    let system = ModelMessage::system("You are helpful.");
    assert_eq!(system.role, Role::System);
    assert_eq!(system.text(), "You are helpful.");

    let user = ModelMessage::user("Hello");
    assert_eq!(user.role, Role::User);

    let tool = ModelMessage::tool_result("call_1", json!({ "result": 42 }), false);
    assert_eq!(tool.role, Role::Tool);
    assert_eq!(tool.text(), "");
}

#[test]
fn assistant_tool_calls_skip_empty_text() {
    let call = AgentToolCall {
        id: "call_search_media".into(),
        name: "search_media".into(),
        arguments: json!({ "title": "Heat" }),
    };

    let bare = ModelMessage::assistant_tool_calls("", vec![call.clone()]);
    assert_eq!(bare.content.len(), 1);
    assert_eq!(bare.tool_calls(), vec![&call]);

    let narrated = ModelMessage::assistant_tool_calls("Looking it up", vec![call]);
    assert_eq!(narrated.content.len(), 2);
    assert_eq!(narrated.text(), "Looking it up");
}

#[test]
fn model_message_wire_shape() {
    let msg = ModelMessage::user("test");
    let value = serde_json::to_value(&msg).unwrap();

    assert_eq!(value["role"], "user");
    assert_eq!(value["content"][0], json!({ "type": "text", "text": "test" }));
}

#[test]
fn memory_records_serialize_with_snake_case_roles() {
    let record = MemoryRecord::tool_call("s1", "u1", "search_media", "search_media", json!({ "title": "Heat" }));
    let value = serde_json::to_value(&record).unwrap();

    assert_eq!(value["role"], "tool_call");
    assert!(value.get("content").is_none());
    assert_eq!(value["metadata"]["tool_name"], "search_media");

    let back: MemoryRecord = serde_json::from_value(value).unwrap();
    assert_eq!(back, record);
}

#[test]
fn session_context_omits_unset_routing() {
    let ctx = SessionContext::new("s1", "u1").with_channel("telegram");
    let value = serde_json::to_value(&ctx).unwrap();

    assert_eq!(value, json!({ "session_id": "s1", "user_id": "u1", "channel": "telegram" }));
}
