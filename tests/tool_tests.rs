//! Tests for the tool system.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use reel::error::ReelError;
use reel::tools::builtin::InMemoryMediaLibrary;
use reel::tools::*;

fn explained(name: &str) -> AgentTool {
    AgentTool::new(
        name,
        "Greet a person",
        AgentToolParameters::object()
            .string("name", "Name", true)
            .explanation()
            .build(),
        |args, _ctx| async move {
            let name = args.get_str("name")?;
            Ok(json!({ "greeting": format!("Hello, {name}!") }))
        },
    )
}

#[test]
fn parameter_builder_constructs_schema() {
    let params = AgentToolParameters::object()
        .string("query", "Search query", true)
        .explanation()
        .integer("limit", "Max results", false)
        .string_enum("format", "Output format", &["json", "text"], false)
        .build();

    let schema = &params.schema;
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["properties"]["query"]["type"], "string");
    assert_eq!(schema["properties"]["limit"]["type"], "integer");
    assert_eq!(schema["properties"]["format"]["enum"].as_array().unwrap().len(), 2);
    assert_eq!(schema["required"], json!(["query", "explanation"]));
    assert!(params.requires_explanation());
}

#[test]
fn tool_arguments_accessors() {
    let args = ToolArguments::new(json!({ "name": "Alice", "age": 30, "explanation": "why" }));

    assert_eq!(args.get_str("name").unwrap(), "Alice");
    assert!(args.get_str("missing").is_err());
    assert_eq!(args.get_str_opt("missing"), None);
    assert_eq!(args.get_i64("age").unwrap(), 30);
    assert_eq!(args.explanation(), Some("why"));
}

#[test]
fn tool_arguments_deserialize() {
    #[derive(serde::Deserialize, PartialEq, Debug)]
    struct Params {
        query: String,
        limit: Option<u32>,
    }

    let args = ToolArguments::new(json!({ "query": "rust", "limit": 10 }));
    let params: Params = args.deserialize().unwrap();
    assert_eq!(params, Params { query: "rust".into(), limit: Some(10) });
}

#[tokio::test]
async fn agent_tool_executes() {
    let tool = explained("greet");

    assert_eq!(tool.name(), "greet");
    assert_eq!(tool.description(), "Greet a person");

    let args = ToolArguments::new(json!({ "name": "World", "explanation": "say hi" }));
    let result = tool
        .execute(&args, &ToolExecutionContext::default())
        .await
        .unwrap();
    assert_eq!(result["greeting"], "Hello, World!");
}

#[test]
fn catalog_enforces_the_contract() {
    let mut catalog = ToolCatalog::new();
    catalog.register(Arc::new(explained("greet"))).unwrap();

    let duplicate = catalog.register(Arc::new(explained("greet"))).unwrap_err();
    assert!(duplicate.contains("duplicate"), "{duplicate}");

    let bad_name = catalog.register(Arc::new(explained("greet everyone"))).unwrap_err();
    assert!(bad_name.contains("invalid tool name"), "{bad_name}");

    let unexplained = AgentTool::new(
        "silent",
        "No explanation",
        AgentToolParameters::object().string("name", "Name", true).build(),
        |_args, _ctx| async { Ok(Value::Null) },
    );
    let missing = catalog.register(Arc::new(unexplained)).unwrap_err();
    assert!(missing.contains("explanation"), "{missing}");

    assert_eq!(catalog.len(), 1);
}

struct Plugin;

#[async_trait]
impl DynamicToolProvider for Plugin {
    fn plugin_id(&self) -> &str {
        "plugin"
    }

    async fn list_tools(&self) -> Result<Vec<DynamicTool>, ReelError> {
        Ok(vec![
            DynamicTool {
                name: "weather".into(),
                description: "Current weather".into(),
                parameters: AgentToolParameters::object()
                    .string("city", "City", true)
                    .explanation()
                    .build(),
            },
            DynamicTool {
                name: "search_media".into(),
                description: "Shadows a built-in".into(),
                parameters: AgentToolParameters::object().explanation().build(),
            },
            DynamicTool {
                name: "loose".into(),
                description: "No explanation".into(),
                parameters: AgentToolParameters::object().build(),
            },
        ])
    }

    async fn execute_tool(
        &self,
        name: &str,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<Value, ReelError> {
        Ok(Value::String(format!("{name}: sunny in {}", args.get_str("city")?)))
    }
}

#[tokio::test]
async fn catalog_sources_append_valid_provider_tools_after_builtins() {
    let sources = CatalogSources::new(Arc::new(InMemoryMediaLibrary::with_sample_catalog()))
        .with_provider(Arc::new(Plugin));

    let catalog = sources.build().await;

    let names: Vec<String> = catalog.list().into_iter().map(|d| d.name).collect();
    assert_eq!(
        names,
        vec![
            "search_media",
            "add_subscribe",
            "query_subscribes",
            "query_media_library",
            "send_message",
            "weather"
        ]
    );

    let weather = catalog.get("weather").unwrap();
    let result = weather
        .execute(
            &ToolArguments::new(json!({ "city": "Oslo", "explanation": "forecast" })),
            &ToolExecutionContext::default(),
        )
        .await
        .unwrap();
    assert_eq!(result, "weather: sunny in Oslo");
}

#[tokio::test]
async fn search_media_finds_sample_titles() {
    let catalog = CatalogSources::new(Arc::new(InMemoryMediaLibrary::with_sample_catalog()))
        .build()
        .await;
    let search = catalog.get("search_media").unwrap();
    let args = ToolArguments::new(json!({ "title": "Matrix", "year": "1999", "explanation": "find it" }));

    assert_eq!(
        search.progress_message(&args).as_deref(),
        Some("Searching media: Matrix (1999)")
    );
    let result = search
        .execute(&args, &ToolExecutionContext::default())
        .await
        .unwrap();
    let hits = result.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "The Matrix");
}
