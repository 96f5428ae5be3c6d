//! Gameflow: a cooperative state machine for sequencing game flow
//!
//! Gameflow drives the high-level flow of a game (splash → menu → level →
//! win/lose → menu …) as a graph of states joined by links. Exactly one state
//! is active at a time. The host ticks the runner once per frame; each tick
//! advances the active state's body by one step, or polls its links once the
//! body has finished.
//!
//! # Core Concepts
//!
//! - **Event**: broadcast primitive raised by collaborators (buttons, triggers)
//! - **Link**: edge to a next state, open always or once its event is raised
//! - **State**: enter/step/exit lifecycle plus owned, ordered links
//! - **Runner**: holds the active state and performs transitions
//!
//! # Example
//!
//! ```rust
//! use gameflow::builder::FlowBuilder;
//! use gameflow::core::{FlowState, GameClock, GameEvent, Link, StateGraph};
//! use gameflow::runner::TickOutcome;
//!
//! let proceed = GameEvent::new("continue");
//! let clock = GameClock::new();
//!
//! let mut graph = StateGraph::new();
//! let splash = graph.add_state(FlowState::delay("splash", 1.0));
//! let menu = graph.add_state(FlowState::plain("menu"));
//! let level = graph.add_state(FlowState::plain("level"));
//! graph.add_link(splash, Link::always(menu)).unwrap();
//! graph.add_link(menu, Link::on_event(&proceed, level)).unwrap();
//!
//! let mut runner = FlowBuilder::new(graph)
//!     .initial(splash)
//!     .clock(clock.clone())
//!     .build()
//!     .unwrap();
//!
//! clock.advance(1.0);
//! assert_eq!(
//!     runner.tick().unwrap(),
//!     TickOutcome::Transitioned { from: splash, to: menu }
//! );
//!
//! proceed.raise();
//! runner.tick().unwrap();
//! assert_eq!(runner.current_name(), Some("level"));
//! ```

pub mod builder;
pub mod core;
pub mod resources;
pub mod runner;
pub mod sequence;

// Re-export commonly used types
pub use builder::{BuildError, FlowBuilder, RunnerConfig};
pub use core::{FlowState, GameClock, GameEvent, Link, StateGraph, StateId};
pub use runner::{FlowError, Runner, TickOutcome};
