//! Reasoning loop: model calls interleaved with tool calls.

pub mod runner;
pub mod types;

pub use runner::*;
pub use types::*;
