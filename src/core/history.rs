//! Transition history tracking.
//!
//! The runner records every transition it takes. History is bounded so a
//! long-running game loop does not grow it without limit; the oldest
//! records are dropped first.

use super::state::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use uuid::Uuid;

/// Record of a single transition.
///
/// # Example
///
/// ```rust
/// use gameflow::core::{FlowHistory, FlowState, StateGraph, TransitionRecord};
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// let mut graph = StateGraph::new();
/// let menu = graph.add_state(FlowState::plain("menu"));
/// let play = graph.add_state(FlowState::plain("play"));
///
/// let mut history = FlowHistory::new(Uuid::new_v4(), None);
/// history.record(TransitionRecord {
///     from: menu,
///     from_name: "menu".into(),
///     to: play,
///     to_name: "play".into(),
///     tick: 1,
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.get_path(), vec![menu, play]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The state being left
    pub from: StateId,
    pub from_name: String,
    /// The state being entered
    pub to: StateId,
    pub to_name: String,
    /// Runner tick on which the transition happened
    pub tick: u64,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

/// Ordered, bounded history of transitions for one runner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowHistory {
    run_id: Uuid,
    limit: Option<usize>,
    dropped: usize,
    transitions: VecDeque<TransitionRecord>,
}

impl FlowHistory {
    /// Create an empty history. `limit` of `None` keeps every record.
    pub fn new(run_id: Uuid, limit: Option<usize>) -> Self {
        Self {
            run_id,
            limit,
            dropped: 0,
            transitions: VecDeque::new(),
        }
    }

    /// Get the run this history belongs to.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Append a record, evicting the oldest one when over the limit.
    pub fn record(&mut self, transition: TransitionRecord) {
        if self.limit == Some(0) {
            self.dropped += 1;
            return;
        }
        self.transitions.push_back(transition);
        if let Some(limit) = self.limit {
            while self.transitions.len() > limit {
                self.transitions.pop_front();
                self.dropped += 1;
            }
        }
    }

    /// States traversed: the first retained source, then every target.
    pub fn get_path(&self) -> Vec<StateId> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(first.from);
        }
        path.extend(self.transitions.iter().map(|t| t.to));
        path
    }

    /// Wall-clock span between the first and last retained transition.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.front()?, self.transitions.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// Retained transitions, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.transitions.iter()
    }

    /// Number of retained transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if no transitions are retained.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Get the most recent transition.
    pub fn last(&self) -> Option<&TransitionRecord> {
        self.transitions.back()
    }

    /// Number of records evicted by the limit.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Export as JSON for diagnostics.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
