//! Core flow types.
//!
//! This module contains the building blocks of a flow graph:
//! - Events that collaborators raise
//! - Links that open on those events (or unconditionally)
//! - States with enter/step/exit lifecycles
//! - The state arena and transition history
//! - The injected game clock used by delay and pause states

mod clock;
mod event;
mod graph;
mod history;
mod link;
mod state;

pub use clock::{GameClock, PauseToken, TimeDomain};
pub use event::{EventListener, GameEvent};
pub use graph::StateGraph;
pub use history::{FlowHistory, TransitionRecord};
pub use link::{EventWatchHandle, Link, LinkId};
pub use state::{Body, BodyContext, Callback, FlowState, StateBody, StateId, Step};
