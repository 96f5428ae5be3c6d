//! Single-active-state runner.

use crate::builder::RunnerConfig;
use crate::core::{BodyContext, FlowHistory, GameClock, Link, StateGraph, StateId, Step, TransitionRecord};
use crate::runner::error::FlowError;
use chrono::Utc;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Result of a single tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The active body yielded and will be stepped again.
    Running(StateId),
    /// The body is done but no link is open yet.
    AwaitingLink(StateId),
    /// A link resolved; `to` is now active and entered.
    Transitioned { from: StateId, to: StateId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Executing,
    AwaitingLink,
    Halted,
}

/// Drives a flow graph one cooperative step per tick.
///
/// # Example
///
/// ```rust
/// use gameflow::core::{FlowState, GameClock, GameEvent, Link, StateGraph};
/// use gameflow::runner::{Runner, TickOutcome};
///
/// let proceed = GameEvent::new("continue");
/// let mut graph = StateGraph::new();
/// let menu = graph.add_state(FlowState::plain("menu"));
/// let level = graph.add_state(FlowState::plain("level"));
/// graph.add_link(menu, Link::on_event(&proceed, level)).unwrap();
///
/// let mut runner = Runner::new(graph, GameClock::new());
/// runner.start(menu).unwrap();
///
/// assert_eq!(runner.tick().unwrap(), TickOutcome::AwaitingLink(menu));
/// proceed.raise();
/// assert_eq!(
///     runner.tick().unwrap(),
///     TickOutcome::Transitioned { from: menu, to: level }
/// );
/// assert_eq!(runner.current(), Some(level));
/// ```
pub struct Runner {
    graph: StateGraph,
    clock: GameClock,
    config: RunnerConfig,
    current: Option<StateId>,
    phase: Phase,
    ticks: u64,
    history: FlowHistory,
}

impl Runner {
    /// Create an idle runner with the default configuration.
    pub fn new(graph: StateGraph, clock: GameClock) -> Self {
        Self::with_config(graph, clock, RunnerConfig::default())
    }

    /// Create an idle runner with `config`.
    pub fn with_config(graph: StateGraph, clock: GameClock, config: RunnerConfig) -> Self {
        let history = FlowHistory::new(Uuid::new_v4(), config.history_limit);
        Self {
            graph,
            clock,
            config,
            current: None,
            phase: Phase::Idle,
            ticks: 0,
            history,
        }
    }

    /// Activate `initial`: enter it and arm its links.
    ///
    /// A state that is already active is exited first, so `start` also
    /// restarts a halted runner.
    pub fn start(&mut self, initial: StateId) -> Result<(), FlowError> {
        self.graph.get(initial)?;
        self.stop();
        info!(
            run_id = %self.history.run_id(),
            state = %self.graph.name_of(initial),
            "flow started"
        );
        self.activate(initial)
    }

    /// Disarm and exit the active state, leaving the runner idle.
    pub fn stop(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };
        let ctx = BodyContext { clock: &self.clock };
        if let Ok(state) = self.graph.get_mut(current) {
            state.disable_links();
            state.exit(&ctx);
        }
        self.phase = Phase::Idle;
        debug!(state = %self.graph.name_of(current), "flow stopped");
    }

    /// Advance the flow by one scheduler step.
    ///
    /// Errors from a body halt the runner; later ticks report
    /// [`FlowError::Halted`] until [`start`](Self::start) is called again.
    pub fn tick(&mut self) -> Result<TickOutcome, FlowError> {
        let current = self.current.ok_or(FlowError::NotStarted)?;
        if self.phase == Phase::Halted {
            return Err(FlowError::Halted {
                state: self.graph.name_of(current).to_string(),
            });
        }
        self.ticks += 1;

        if self.phase == Phase::Executing {
            let ctx = BodyContext { clock: &self.clock };
            let state = self.graph.get_mut(current)?;
            match state.step(&ctx) {
                Ok(Step::Yield) => return Ok(TickOutcome::Running(current)),
                Ok(Step::Done) => {
                    debug!(state = %state.name(), tick = self.ticks, "body complete");
                    self.phase = Phase::AwaitingLink;
                }
                Err(err) => {
                    warn!(state = %state.name(), error = %err, "state failed, halting flow");
                    self.phase = Phase::Halted;
                    return Err(err);
                }
            }
        }

        match self.graph.validate_links(current)? {
            Some(next) => {
                self.transition(current, next)?;
                Ok(TickOutcome::Transitioned {
                    from: current,
                    to: next,
                })
            }
            None => {
                trace!(state = %self.graph.name_of(current), tick = self.ticks, "awaiting link");
                Ok(TickOutcome::AwaitingLink(current))
            }
        }
    }

    /// Replace the links of `state`.
    ///
    /// If `state` is active its new links are armed immediately, so the
    /// runner never polls a stale or disarmed set.
    pub fn rebind_links(&mut self, state: StateId, links: Vec<Link>) -> Result<(), FlowError> {
        self.graph.replace_links(state, links)?;
        if self.current == Some(state) {
            self.graph.enable_links(state)?;
        }
        debug!(state = %self.graph.name_of(state), "links rebound");
        Ok(())
    }

    /// Get the active state, if started.
    pub fn current(&self) -> Option<StateId> {
        self.current
    }

    /// Debug name of the active state.
    pub fn current_name(&self) -> Option<&str> {
        self.current.map(|id| self.graph.name_of(id))
    }

    /// Whether the active body has finished and the runner is polling links.
    pub fn is_awaiting_link(&self) -> bool {
        self.phase == Phase::AwaitingLink
    }

    /// Whether a body failure stopped the flow.
    pub fn is_halted(&self) -> bool {
        self.phase == Phase::Halted
    }

    /// Get the flow graph.
    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    /// Mutable graph access. Rebinding the active state's links through
    /// this handle requires re-arming them; prefer [`rebind_links`](Self::rebind_links).
    pub fn graph_mut(&mut self) -> &mut StateGraph {
        &mut self.graph
    }

    /// Get the clock bodies measure time against.
    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Get the runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Get the transition history.
    pub fn history(&self) -> &FlowHistory {
        &self.history
    }

    /// Number of ticks processed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Identifier attached to this runner's logs and history.
    pub fn run_id(&self) -> Uuid {
        self.history.run_id()
    }

    fn activate(&mut self, id: StateId) -> Result<(), FlowError> {
        let ctx = BodyContext { clock: &self.clock };
        let state = self.graph.get_mut(id)?;
        state.enter(&ctx);
        state.enable_links();
        self.current = Some(id);
        self.phase = Phase::Executing;
        Ok(())
    }

    fn transition(&mut self, from: StateId, to: StateId) -> Result<(), FlowError> {
        if !self.graph.contains(to) {
            self.phase = Phase::Halted;
            return Err(FlowError::UnknownState(to));
        }

        let ctx = BodyContext { clock: &self.clock };
        let state = self.graph.get_mut(from)?;
        state.disable_links();
        state.exit(&ctx);

        let from_name = self.graph.name_of(from).to_string();
        let to_name = self.graph.name_of(to).to_string();
        info!(
            run_id = %self.history.run_id(),
            from = %from_name,
            to = %to_name,
            tick = self.ticks,
            "transition"
        );
        if self.config.record_history {
            self.history.record(TransitionRecord {
                from,
                from_name,
                to,
                to_name,
                tick: self.ticks,
                timestamp: Utc::now(),
            });
        }

        self.activate(to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FlowState, GameEvent};

    fn two_state_loop(event: &GameEvent) -> (StateGraph, StateId, StateId) {
        let mut graph = StateGraph::new();
        let s1 = graph.add_state(FlowState::plain("s1"));
        let s2 = graph.add_state(FlowState::plain("s2"));
        graph.add_link(s1, Link::on_event(event, s2)).unwrap();
        graph.add_link(s2, Link::always(s1)).unwrap();
        (graph, s1, s2)
    }

    #[test]
    fn tick_before_start_is_an_error() {
        let mut runner = Runner::new(StateGraph::new(), GameClock::new());
        assert_eq!(runner.tick().unwrap_err(), FlowError::NotStarted);
    }

    #[test]
    fn start_rejects_unknown_state() {
        let mut runner = Runner::new(StateGraph::new(), GameClock::new());
        assert!(matches!(
            runner.start(StateId(0)),
            Err(FlowError::UnknownState(_))
        ));
    }

    #[test]
    fn event_raised_repeatedly_transitions_once() {
        let event = GameEvent::new("e");
        let (graph, s1, s2) = two_state_loop(&event);
        let mut runner = Runner::new(graph, GameClock::new());
        runner.start(s1).unwrap();

        event.raise();
        event.raise();
        event.raise();

        assert_eq!(
            runner.tick().unwrap(),
            TickOutcome::Transitioned { from: s1, to: s2 }
        );
        assert_eq!(
            runner.tick().unwrap(),
            TickOutcome::Transitioned { from: s2, to: s1 }
        );
        assert_eq!(runner.tick().unwrap(), TickOutcome::AwaitingLink(s1));
        assert_eq!(runner.history().len(), 2);
    }

    #[test]
    fn only_active_state_links_are_armed() {
        let event = GameEvent::new("e");
        let (graph, s1, _) = two_state_loop(&event);
        let mut runner = Runner::new(graph, GameClock::new());

        assert_eq!(event.listener_count(), 0);
        runner.start(s1).unwrap();
        assert_eq!(event.listener_count(), 1);

        event.raise();
        runner.tick().unwrap();
        assert_eq!(event.listener_count(), 0);
    }

    #[test]
    fn body_failure_halts_runner() {
        let mut graph = StateGraph::new();
        let resources = crate::resources::ResourceController::new(
            crate::resources::testing::ScriptedBackend::new(1),
            "boot",
        )
        .shared();
        let bad = graph.add_state(FlowState::load("bad", &resources, ""));
        let mut runner = Runner::new(graph, GameClock::new());
        runner.start(bad).unwrap();

        assert!(matches!(
            runner.tick(),
            Err(FlowError::InvalidResourceId { .. })
        ));
        assert!(runner.is_halted());
        assert!(matches!(runner.tick(), Err(FlowError::Halted { .. })));
        assert_eq!(runner.current(), Some(bad));
    }

    #[test]
    fn rebinding_active_state_rearms_links() {
        let a_event = GameEvent::new("a");
        let b_event = GameEvent::new("b");
        let mut graph = StateGraph::new();
        let hub = graph.add_state(FlowState::plain("hub"));
        let left = graph.add_state(FlowState::plain("left"));
        let right = graph.add_state(FlowState::plain("right"));
        graph.add_link(hub, Link::on_event(&a_event, left)).unwrap();

        let mut runner = Runner::new(graph, GameClock::new());
        runner.start(hub).unwrap();
        runner.tick().unwrap();

        runner
            .rebind_links(hub, vec![Link::on_event(&b_event, right)])
            .unwrap();
        assert_eq!(a_event.listener_count(), 0);

        b_event.raise();
        assert_eq!(
            runner.tick().unwrap(),
            TickOutcome::Transitioned {
                from: hub,
                to: right
            }
        );
    }

    #[test]
    fn history_can_be_disabled() {
        let event = GameEvent::new("e");
        let (graph, s1, _) = two_state_loop(&event);
        let config = RunnerConfig {
            record_history: false,
            ..RunnerConfig::default()
        };
        let mut runner = Runner::with_config(graph, GameClock::new(), config);
        runner.start(s1).unwrap();

        event.raise();
        runner.tick().unwrap();

        assert!(runner.history().is_empty());
        assert_eq!(runner.ticks(), 1);
    }

    #[test]
    fn stop_exits_pause_state() {
        let clock = GameClock::new();
        let mut graph = StateGraph::new();
        let paused = graph.add_state(FlowState::pause("paused", || {}));
        let mut runner = Runner::new(graph, clock.clone());

        runner.start(paused).unwrap();
        assert!(clock.is_paused());

        runner.stop();
        assert!(!clock.is_paused());
        assert_eq!(runner.current(), None);
    }
}
