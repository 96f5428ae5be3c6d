//! The runner: the imperative shell that drives a flow graph.
//!
//! A [`Runner`] owns a [`StateGraph`](crate::core::StateGraph) and keeps
//! exactly one state active. The host calls [`Runner::tick`] once per frame;
//! each tick advances the active body by one step or, once the body is done,
//! polls its links. At most one transition happens per tick.

mod error;
mod machine;

pub use error::FlowError;
pub use machine::{Runner, TickOutcome};
