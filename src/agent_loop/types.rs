//! Outcome types for one reasoning run.

use serde::{Deserialize, Serialize};

use crate::types::{AgentToolCall, ModelMessage, Usage};

/// One tool invocation made during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolStep {
    pub call: AgentToolCall,
    pub result: serde_json::Value,
}

/// What a completed run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReasoningTrace {
    pub steps: Vec<ToolStep>,
    /// Usage summed over every model call of the run.
    pub usage: Usage,
    /// Messages produced by the run, in order (assistant turns and tool results).
    pub messages: Vec<ModelMessage>,
    pub iterations: usize,
    /// The iteration cap was reached before the model finished.
    pub stopped_early: bool,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Completed(ReasoningTrace),
    Cancelled,
    Failed(String),
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The run's trace; cancelled and failed runs yield an empty one.
    pub fn into_trace(self) -> ReasoningTrace {
        match self {
            Self::Completed(trace) => trace,
            Self::Cancelled | Self::Failed(_) => ReasoningTrace::default(),
        }
    }
}
