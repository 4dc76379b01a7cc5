//! Tool system: contract, catalog and built-in tools.

pub mod arguments;
pub mod builtin;
pub mod catalog;
pub mod contract;
pub mod dynamic;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use catalog::{CatalogSources, ToolCatalog, ToolDescriptor};
pub use contract::{ToolExecutionContract, CANCELLED_TOOL_RESULT};
pub use dynamic::{DynamicTool, DynamicToolAdapter, DynamicToolProvider};
pub use tool::{AgentTool, Tool, ToolExecutionContext};
pub use types::{AgentToolParameters, EXPLANATION_FIELD};
