//! Errors raised while driving a flow.

use crate::core::StateId;
use thiserror::Error;

/// Errors that can occur while building links or ticking a runner.
///
/// None of these are retried by the runner: each one means the graph or a
/// collaborator is misconfigured, and the flow does not advance past it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FlowError {
    #[error("Runner has no active state. Call start(initial) before tick()")]
    NotStarted,

    #[error("State {0} does not exist in this graph")]
    UnknownState(StateId),

    #[error("Link from '{from}' targets state {target}, which is not in the graph")]
    InvalidLinkTarget { from: String, target: StateId },

    #[error("Resource id {id:?} is empty or invalid")]
    InvalidResourceId { id: String },

    #[error("Operation on resource '{resource}' failed: {reason}")]
    OperationFailed { resource: String, reason: String },

    #[error("State '{state}' failed: {message}")]
    Body { state: String, message: String },

    #[error("Runner halted after state '{state}' failed. Call start() to run again")]
    Halted { state: String },

    #[error("Level index {index} is out of range ({count} levels)")]
    UnknownLevel { index: usize, count: usize },
}

impl FlowError {
    /// Failure raised by a custom body.
    pub fn body(state: impl Into<String>, message: impl Into<String>) -> Self {
        FlowError::Body {
            state: state.into(),
            message: message.into(),
        }
    }
}
