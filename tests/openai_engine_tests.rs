//! Tests for the OpenAI-compatible engine against a mock server.

#![cfg(feature = "openai")]

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reel::config::LlmSettings;
use reel::error::ReelError;
use reel::provider::openai::{OpenAiEngine, OpenAiEngineFactory};
use reel::provider::{EngineFactory, EngineRequest, ReasoningEngine, ToolDefinition};
use reel::stream::StreamingSink;
use reel::types::ModelMessage;

fn settings(base_url: &str) -> LlmSettings {
    LlmSettings {
        api_key: Some("sk-test".into()),
        base_url: Some(base_url.to_string()),
        ..LlmSettings::default()
    }
}

fn sse(events: &[serde_json::Value]) -> String {
    let mut body: String = events.iter().map(|e| format!("data: {e}\n\n")).collect();
    body.push_str("data: [DONE]\n\n");
    body
}

fn request() -> EngineRequest {
    EngineRequest {
        messages: vec![ModelMessage::system("be brief"), ModelMessage::user("hi")],
        tools: vec![],
        temperature: None,
    }
}

#[tokio::test]
async fn streamed_text_lands_in_the_sink() {
    let server = MockServer::start().await;
    let body = sse(&[
        json!({ "choices": [{ "delta": { "content": "Hel" } }] }),
        json!({ "choices": [{ "delta": { "content": "lo!" } }] }),
        json!({ "choices": [], "usage": { "prompt_tokens": 7, "completion_tokens": 2, "total_tokens": 9 } }),
    ]);
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_string_contains("\"stream\":true"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let engine = OpenAiEngine::new(&settings(&server.uri())).unwrap();
    let sink = StreamingSink::new();
    let response = engine.complete(&request(), &sink).await.unwrap();

    assert_eq!(response.text, "Hello!");
    assert!(response.tool_calls.is_empty());
    assert_eq!(response.usage.total_tokens, 9);
    assert_eq!(sink.take().await, "Hello!");
}

#[tokio::test]
async fn tool_call_deltas_are_assembled() {
    let server = MockServer::start().await;
    let body = sse(&[
        json!({ "choices": [{ "delta": { "tool_calls": [
            { "index": 0, "id": "call_abc", "function": { "name": "search_media", "arguments": "{\"title\":" } }
        ] } }] }),
        json!({ "choices": [{ "delta": { "tool_calls": [
            { "index": 0, "function": { "arguments": "\"Heat\",\"explanation\":\"look\"}" } }
        ] } }] }),
    ]);
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("\"tools\""))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let engine = OpenAiEngine::new(&settings(&server.uri())).unwrap();
    let mut req = request();
    req.tools.push(ToolDefinition {
        name: "search_media".into(),
        description: "Search".into(),
        parameters: json!({ "type": "object" }),
    });
    let sink = StreamingSink::new();
    let response = engine.complete(&req, &sink).await.unwrap();

    assert_eq!(response.tool_calls.len(), 1);
    let call = &response.tool_calls[0];
    assert_eq!(call.id, "call_abc");
    assert_eq!(call.name, "search_media");
    assert_eq!(call.arguments, json!({ "title": "Heat", "explanation": "look" }));
    assert!(sink.is_empty().await);
}

#[tokio::test]
async fn http_errors_map_to_error_variants() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let engine = OpenAiEngine::new(&settings(&server.uri())).unwrap();
    let err = engine
        .complete(&request(), &StreamingSink::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ReelError::Authentication(_)), "{err}");
}

#[tokio::test]
async fn rate_limits_carry_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429).set_body_string(r#"{"error":{"retry_after":1.5}}"#),
        )
        .mount(&server)
        .await;

    let engine = OpenAiEngine::new(&settings(&server.uri())).unwrap();
    let err = engine
        .complete(&request(), &StreamingSink::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ReelError::RateLimited { retry_after_ms: Some(1500) }), "{err}");
    assert!(err.is_retryable());
}

#[test]
fn factory_rejects_missing_key_and_unknown_provider() {
    let missing = LlmSettings::default();
    assert!(matches!(
        OpenAiEngineFactory.create(&missing),
        Err(ReelError::Configuration(_))
    ));

    let unknown = LlmSettings {
        provider: "acme".into(),
        api_key: Some("k".into()),
        ..LlmSettings::default()
    };
    assert!(matches!(
        OpenAiEngineFactory.create(&unknown),
        Err(ReelError::Configuration(_))
    ));

    let deepseek = LlmSettings {
        provider: "DeepSeek".into(),
        api_key: Some("k".into()),
        ..LlmSettings::default()
    };
    let engine = OpenAiEngineFactory.create(&deepseek).unwrap();
    assert_eq!(engine.provider_name(), "deepseek");
}
