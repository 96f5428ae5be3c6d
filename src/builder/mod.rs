//! Builder API for assembling a validated, started runner.
//!
//! Graphs are composed with [`StateGraph`](crate::core::StateGraph); this
//! module checks the result as a whole and hands back a running
//! [`Runner`](crate::runner::Runner).
//!
//! # Example
//!
//! ```rust
//! use gameflow::builder::FlowBuilder;
//! use gameflow::core::{FlowState, Link, StateGraph};
//!
//! let mut graph = StateGraph::new();
//! let splash = graph.add_state(FlowState::plain("splash"));
//! let menu = graph.add_state(FlowState::plain("menu"));
//! graph.add_link(splash, Link::always(menu)).unwrap();
//!
//! let mut runner = FlowBuilder::new(graph).initial(splash).build().unwrap();
//! runner.tick().unwrap();
//! assert_eq!(runner.current_name(), Some("menu"));
//! ```

pub mod config;
pub mod error;
pub mod machine;
pub mod validate;

pub use config::RunnerConfig;
pub use error::BuildError;
pub use machine::FlowBuilder;
pub use validate::{graph_violations, validate_graph, GraphViolation};
