//! Reel: a multi-session agent runtime with an MCP tool gateway.
//!
//! Each inbound user message runs one turn of an [`agent::AgentSession`]:
//! conversation memory is replayed, a bounded reasoning loop calls tools
//! through a uniform execution contract, and the streamed reply is dispatched
//! to the user's channel. The same tool catalog is exposed to third-party
//! clients through a JSON-RPC [`mcp::McpGateway`].
//!
//! # Quick Start
//!
//! ```no_run
//! use reel::prelude::*;
//! use reel::runtime::{Runtime, RuntimeParts};
//!
//! # async fn example() -> reel::error::Result<()> {
//! let config = ReelConfig::load(None)?;
//! let runtime = Runtime::init(config, RuntimeParts::local());
//! let reply = runtime
//!     .process_message("s1", "u1", "search The Matrix", Some("telegram"), None, None)
//!     .await?;
//! println!("{reply}");
//! runtime.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod agent_loop;
pub mod config;
pub mod error;
pub mod mcp;
pub mod memory;
pub mod notify;
pub mod prelude;
pub mod provider;
pub mod runtime;
pub mod stream;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
