//! Build errors for flow runners.

use super::validate::GraphViolation;
use crate::core::StateId;
use crate::runner::FlowError;
use thiserror::Error;

/// Errors that can occur when building a runner from a graph.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Initial state {0} is not in the graph")]
    UnknownInitialState(StateId),

    #[error("Graph has {} violation(s): {}", .0.len(), summarize(.0))]
    InvalidGraph(Vec<GraphViolation>),

    #[error("Failed to start flow: {0}")]
    Start(#[from] FlowError),
}

fn summarize(violations: &[GraphViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
