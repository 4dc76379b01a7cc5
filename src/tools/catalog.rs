//! The set of invocable tools.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use super::arguments::ToolArguments;
use super::builtin::{self, MediaLibrary};
use super::dynamic::{DynamicToolAdapter, DynamicToolProvider};
use super::tool::{Tool, ToolExecutionContext};
use super::validation::validate_arguments;
use crate::error::ReelError;

static TOOL_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("tool name validation regex must compile")
});

/// Public description of one catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    fn of(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.parameters().schema.clone(),
        }
    }
}

/// Check a tool against the capability contract.
///
/// Returns a description of the first violation.
pub fn check_contract(tool: &dyn Tool, taken: &HashSet<String>) -> Result<(), String> {
    let name = tool.name();
    if !TOOL_NAME_RE.is_match(name) {
        return Err(format!("invalid tool name '{name}'"));
    }
    if taken.contains(name) {
        return Err(format!("duplicate tool name '{name}'"));
    }
    if tool.description().trim().is_empty() {
        return Err(format!("tool '{name}' has no description"));
    }
    let schema = &tool.parameters().schema;
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Err(format!("tool '{name}' schema is not an object schema"));
    }
    if !tool.parameters().requires_explanation() {
        return Err(format!(
            "tool '{name}' schema does not declare a required string 'explanation'"
        ));
    }
    Ok(())
}

/// Render a tool result as text.
///
/// Strings pass through unchanged, numbers and booleans use their JSON text,
/// everything else is pretty-printed JSON.
pub fn normalize_result(result: &Value) -> String {
    match result {
        Value::String(s) => s.clone(),
        Value::Number(_) | Value::Bool(_) | Value::Null => result.to_string(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Validate `args` against the tool's schema, then run it.
///
/// A schema violation is returned as a descriptive string result so the model
/// can correct itself. Errors from the tool itself propagate.
pub async fn invoke(
    tool: &dyn Tool,
    args: &ToolArguments,
    ctx: &ToolExecutionContext,
) -> Result<Value, ReelError> {
    if let Err(violation) = validate_arguments(args.raw(), &tool.parameters().schema) {
        warn!(tool = tool.name(), %violation, "tool arguments rejected");
        return Ok(Value::String(format!(
            "Invalid arguments for tool '{}': {violation}",
            tool.name()
        )));
    }
    tool.execute(args, ctx).await
}

/// Ordered, name-unique collection of tools satisfying the tool contract.
#[derive(Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<Arc<dyn Tool>>,
    names: HashSet<String>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool if it satisfies the contract.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), String> {
        check_contract(tool.as_ref(), &self.names)?;
        self.names.insert(tool.name().to_string());
        self.tools.push(tool);
        Ok(())
    }

    /// Register every tool announced by `provider`, skipping the ones that
    /// violate the contract.
    pub async fn extend_from(&mut self, provider: Arc<dyn DynamicToolProvider>) {
        let announced = match provider.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                error!(plugin = provider.plugin_id(), error = %e, "tool provider listing failed; skipping provider");
                return;
            }
        };
        for tool in announced {
            let name = tool.name.clone();
            let adapter = Arc::new(DynamicToolAdapter::new(provider.clone(), tool));
            match self.register(adapter) {
                Ok(()) => debug!(plugin = provider.plugin_id(), tool = %name, "plugin tool registered"),
                Err(reason) => warn!(plugin = provider.plugin_id(), tool = %name, %reason, "skipping plugin tool"),
            }
        }
    }

    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| ToolDescriptor::of(t.as_ref())).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name and return its normalized text result.
    pub async fn call(
        &self,
        name: &str,
        args: Value,
        ctx: &ToolExecutionContext,
    ) -> Result<String, ReelError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ReelError::ToolNotFound(name.to_string()))?;
        let result = invoke(tool.as_ref(), &ToolArguments::new(args), ctx).await?;
        Ok(normalize_result(&result))
    }
}

impl std::fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCatalog")
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Everything a catalog is built from.
///
/// Shared by the agent sessions and the MCP gateway, which each build their
/// own catalog instances.
#[derive(Clone)]
pub struct CatalogSources {
    library: Arc<dyn MediaLibrary>,
    providers: Vec<Arc<dyn DynamicToolProvider>>,
}

impl CatalogSources {
    pub fn new(library: Arc<dyn MediaLibrary>) -> Self {
        Self {
            library,
            providers: Vec::new(),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn DynamicToolProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Build a catalog: built-ins first, then provider tools in provider order.
    pub async fn build(&self) -> ToolCatalog {
        let mut catalog = ToolCatalog::new();
        for tool in builtin::all_tools(self.library.clone()) {
            let name = tool.name().to_string();
            if let Err(reason) = catalog.register(tool) {
                warn!(tool = %name, %reason, "skipping built-in tool");
            }
        }
        for provider in &self.providers {
            catalog.extend_from(provider.clone()).await;
        }
        debug!(tools = catalog.len(), "tool catalog built");
        catalog
    }
}

impl std::fmt::Debug for CatalogSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogSources")
            .field("providers", &self.providers.iter().map(|p| p.plugin_id()).collect::<Vec<_>>())
            .finish()
    }
}
