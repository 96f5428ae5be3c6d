//! Builder for constructing runners.

use crate::builder::config::RunnerConfig;
use crate::builder::error::BuildError;
use crate::builder::validate::graph_violations;
use crate::core::{GameClock, StateGraph, StateId};
use crate::runner::Runner;

/// Builder for a started [`Runner`] with a fluent API.
///
/// `build` validates the whole graph, then enters the initial state.
pub struct FlowBuilder {
    graph: StateGraph,
    initial: Option<StateId>,
    clock: Option<GameClock>,
    config: RunnerConfig,
}

impl FlowBuilder {
    /// Create a builder over `graph`.
    pub fn new(graph: StateGraph) -> Self {
        Self {
            graph,
            initial: None,
            clock: None,
            config: RunnerConfig::default(),
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: StateId) -> Self {
        self.initial = Some(state);
        self
    }

    /// Share a clock with the host. Defaults to a fresh clock.
    pub fn clock(mut self, clock: GameClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the runner configuration.
    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the graph and start the runner.
    pub fn build(self) -> Result<Runner, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        if !self.graph.contains(initial) {
            return Err(BuildError::UnknownInitialState(initial));
        }

        let violations = graph_violations(&self.graph);
        if !violations.is_empty() {
            return Err(BuildError::InvalidGraph(violations));
        }

        let clock = self.clock.unwrap_or_default();
        let mut runner = Runner::with_config(self.graph, clock, self.config);
        runner.start(initial)?;
        Ok(runner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphViolation;
    use crate::core::{FlowState, Link};

    #[test]
    fn builder_requires_initial_state() {
        let result = FlowBuilder::new(StateGraph::new()).build();
        assert!(matches!(result, Err(BuildError::MissingInitialState)));
    }

    #[test]
    fn builder_rejects_unknown_initial_state() {
        let mut graph = StateGraph::new();
        let only = graph.add_state(FlowState::plain("only"));
        let other = StateGraph::new();

        let result = FlowBuilder::new(other).initial(only).build();
        assert!(matches!(result, Err(BuildError::UnknownInitialState(_))));
    }

    #[test]
    fn builder_reports_graph_violations() {
        let mut graph = StateGraph::new();
        let mut start = FlowState::plain("start");
        start.add_link(Link::always(StateId(3)));
        let start = graph.add_state(start);

        match FlowBuilder::new(graph).initial(start).build() {
            Err(BuildError::InvalidGraph(violations)) => {
                assert_eq!(violations.len(), 1);
                assert!(matches!(
                    violations[0],
                    GraphViolation::DanglingLinkTarget { .. }
                ));
            }
            _ => panic!("Expected InvalidGraph"),
        }
    }

    #[test]
    fn fluent_api_builds_started_runner() {
        let clock = GameClock::new();
        let mut graph = StateGraph::new();
        let a = graph.add_state(FlowState::pause("a", || {}));
        let b = graph.add_state(FlowState::plain("b"));
        graph.add_link(a, Link::always(b)).unwrap();

        let runner = FlowBuilder::new(graph)
            .initial(a)
            .clock(clock.clone())
            .config(RunnerConfig {
                history_limit: Some(4),
                ..RunnerConfig::default()
            })
            .build()
            .unwrap();

        assert_eq!(runner.current(), Some(a));
        assert!(clock.is_paused());
        assert_eq!(runner.config().history_limit, Some(4));
    }
}
