//! Reusable game-flow sub-sequences spliced into one graph.
//!
//! [`GameSequence::build`] composes a splash screen, menu navigation, and one
//! gameplay block per level (load, gameplay, win/lose/pause satellites). The
//! blocks share link targets: every level's "quit" leads back to level
//! select, and each win screen continues into the next level.
//!
//! ```text
//! splash ─▶ splash-delay ─▶ main-menu ◀─back─▶ level-select ─continue─▶ load:N
//!                                                                         │
//!            ┌──────────────────────── gameplay:N ◀─────────────────────┘
//!            ├─win──▶ win:N ──continue──▶ load:N+1 (or unload ─▶ level-select)
//!            ├─lose─▶ lose:N ─continue─▶ load:N │ back ─▶ unload ─▶ level-select
//!            └─pause▶ pause:N ─continue─▶ gameplay:N │ back ─▶ unload ─▶ main-menu
//! ```
//!
//! A level configured from a definition enters through `create:N` instead of
//! `load:N`: its empty resource is created, then handed to the notifier.

mod collaborators;

pub use collaborators::{
    AppPauseDetector, FlowNotifier, MemoryProgress, ProgressStore, SilentNotifier,
};

use crate::core::{FlowState, GameEvent, Link, StateGraph, StateId};
use crate::resources::{ResourceBackend, ResourceController, SharedResources};
use crate::runner::{FlowError, Runner};
use collaborators::record_win;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Events the game flow reacts to.
#[derive(Clone, Debug)]
pub struct FlowEvents {
    pub proceed: GameEvent,
    pub back: GameEvent,
    pub win: GameEvent,
    pub lose: GameEvent,
    pub pause: GameEvent,
}

impl FlowEvents {
    /// Fresh events named after their purpose.
    pub fn new() -> Self {
        Self {
            proceed: GameEvent::new("continue"),
            back: GameEvent::new("back"),
            win: GameEvent::new("win"),
            lose: GameEvent::new("lose"),
            pause: GameEvent::new("pause"),
        }
    }
}

impl Default for FlowEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a level's content comes from.
///
/// Deserializes from a bare string (a stored resource) or from
/// `{ "definition": "..." }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSource {
    /// Stored resource loaded as-is.
    Resource(String),
    /// Level definition built into a freshly created, empty resource.
    Definition { definition: String },
}

impl LevelSource {
    /// Resource id the level occupies once loaded or created.
    pub fn resource_id(&self) -> &str {
        match self {
            LevelSource::Resource(id) => id,
            LevelSource::Definition { definition } => definition,
        }
    }
}

impl From<&str> for LevelSource {
    fn from(resource: &str) -> Self {
        LevelSource::Resource(resource.to_string())
    }
}

/// Shape of the game flow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Seconds of game time between the splash screen and the main menu.
    pub splash_delay: f64,
    /// Levels in play order.
    pub levels: Vec<LevelSource>,
    /// Resource that is never unloaded.
    pub base_resource: String,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            splash_delay: 2.0,
            levels: Vec::new(),
            base_resource: "boot".to_string(),
        }
    }
}

impl SequenceConfig {
    /// Resource controller rooted at [`base_resource`](Self::base_resource).
    pub fn resource_controller(&self, backend: impl ResourceBackend + 'static) -> SharedResources {
        ResourceController::new(backend, self.base_resource.clone()).shared()
    }
}

/// Collaborators wired into state callbacks and bodies.
#[derive(Clone)]
pub struct Collaborators {
    pub notifier: Arc<dyn FlowNotifier>,
    pub progress: Arc<dyn ProgressStore>,
    pub resources: SharedResources,
}

/// Handles to the states of a built game flow.
#[derive(Debug)]
pub struct GameSequence {
    splash: StateId,
    splash_delay: StateId,
    main_menu: StateId,
    level_select: StateId,
    levels: Vec<LevelStates>,
    events: FlowEvents,
}

/// States created for one level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelStates {
    pub load: StateId,
    pub gameplay: StateId,
    pub win: StateId,
    pub lose: StateId,
    pub pause: StateId,
}

impl GameSequence {
    /// Add the whole game flow to `graph`, starting level select at level 0.
    pub fn build(
        graph: &mut StateGraph,
        config: &SequenceConfig,
        events: FlowEvents,
        collaborators: &Collaborators,
    ) -> Result<Self, FlowError> {
        let notifier = Arc::clone(&collaborators.notifier);
        let splash = graph.add_state(FlowState::with_callback("splash", move || {
            notifier.splash_shown()
        }));

        let (splash_delay, main_menu, level_select) =
            Self::menu_navigation(graph, config, &events, collaborators, splash)?;

        let mut sequence = Self {
            splash,
            splash_delay,
            main_menu,
            level_select,
            levels: Vec::with_capacity(config.levels.len()),
            events,
        };
        sequence.level_sequences(graph, config, collaborators)?;

        if !sequence.levels.is_empty() {
            graph.replace_links(level_select, sequence.level_select_links(0)?)?;
        }
        debug!(levels = sequence.levels.len(), states = graph.len(), "game flow built");
        Ok(sequence)
    }

    fn menu_navigation(
        graph: &mut StateGraph,
        config: &SequenceConfig,
        events: &FlowEvents,
        collaborators: &Collaborators,
        splash: StateId,
    ) -> Result<(StateId, StateId, StateId), FlowError> {
        let splash_delay = graph.add_state(FlowState::delay("splash-delay", config.splash_delay));

        let notifier = Arc::clone(&collaborators.notifier);
        let main_menu = graph.add_state(FlowState::with_callback("main-menu", move || {
            notifier.main_menu_shown()
        }));

        let notifier = Arc::clone(&collaborators.notifier);
        let level_select = graph.add_state(FlowState::with_callback("level-select", move || {
            notifier.level_select_shown()
        }));

        graph.add_link(splash, Link::always(splash_delay))?;
        graph.add_link(splash_delay, Link::always(main_menu))?;
        graph.add_link(main_menu, Link::on_event(&events.proceed, level_select))?;
        graph.add_link(level_select, Link::on_event(&events.back, main_menu))?;

        Ok((splash_delay, main_menu, level_select))
    }

    fn level_sequences(
        &mut self,
        graph: &mut StateGraph,
        config: &SequenceConfig,
        collaborators: &Collaborators,
    ) -> Result<(), FlowError> {
        let level_count = config.levels.len();
        let mut previous_win: Option<StateId> = None;

        for (index, source) in config.levels.iter().enumerate() {
            let load = graph.add_state(Self::level_entry(collaborators, source, index));
            let level = self.level_satellites(graph, collaborators, load, index, level_count)?;

            if let Some(win) = previous_win {
                graph.add_link(win, Link::on_event(&self.events.proceed, load))?;
            }
            previous_win = Some(level.win);
            self.levels.push(level);
        }

        // Close the loop: the last win screen returns to level select.
        if let Some(last_win) = previous_win {
            let unload = graph.add_state(FlowState::unload(
                "unload:last-level",
                &collaborators.resources,
            ));
            graph.add_link(last_win, Link::on_event(&self.events.proceed, unload))?;
            graph.add_link(unload, Link::always(self.level_select))?;
        }
        Ok(())
    }

    fn level_entry(collaborators: &Collaborators, source: &LevelSource, index: usize) -> FlowState {
        match source {
            LevelSource::Resource(resource) => FlowState::load(
                format!("load:{resource}"),
                &collaborators.resources,
                resource.clone(),
            ),
            LevelSource::Definition { definition } => {
                let notifier = Arc::clone(&collaborators.notifier);
                FlowState::create_then(
                    format!("create:{definition}"),
                    &collaborators.resources,
                    definition.clone(),
                    move || notifier.level_created(index),
                )
            }
        }
    }

    fn level_satellites(
        &self,
        graph: &mut StateGraph,
        collaborators: &Collaborators,
        load: StateId,
        index: usize,
        level_count: usize,
    ) -> Result<LevelStates, FlowError> {
        let notifier = Arc::clone(&collaborators.notifier);
        let gameplay = graph.add_state(FlowState::with_callback(
            format!("gameplay:{index}"),
            move || notifier.gameplay_started(index),
        ));

        let notifier = Arc::clone(&collaborators.notifier);
        let progress = Arc::clone(&collaborators.progress);
        let win = graph.add_state(FlowState::pause(format!("win:{index}"), move || {
            notifier.level_won(index);
            record_win(progress.as_ref(), index, level_count);
        }));

        let notifier = Arc::clone(&collaborators.notifier);
        let lose = graph.add_state(FlowState::pause(format!("lose:{index}"), move || {
            notifier.level_lost(index)
        }));

        let notifier = Arc::clone(&collaborators.notifier);
        let pause = graph.add_state(FlowState::pause(format!("pause:{index}"), move || {
            notifier.game_paused(index)
        }));

        let unload_lose = graph.add_state(FlowState::unload(
            format!("unload-lose:{index}"),
            &collaborators.resources,
        ));
        let unload_pause = graph.add_state(FlowState::unload(
            format!("unload-pause:{index}"),
            &collaborators.resources,
        ));

        let events = &self.events;
        graph.add_link(load, Link::always(gameplay))?;

        graph.add_link(gameplay, Link::on_event(&events.win, win))?;
        graph.add_link(gameplay, Link::on_event(&events.lose, lose))?;
        graph.add_link(gameplay, Link::on_event(&events.pause, pause))?;

        graph.add_link(lose, Link::on_event(&events.proceed, load))?;
        graph.add_link(lose, Link::on_event(&events.back, unload_lose))?;
        graph.add_link(unload_lose, Link::always(self.level_select))?;

        graph.add_link(pause, Link::on_event(&events.proceed, gameplay))?;
        graph.add_link(pause, Link::on_event(&events.back, unload_pause))?;
        graph.add_link(unload_pause, Link::always(self.main_menu))?;

        Ok(LevelStates {
            load,
            gameplay,
            win,
            lose,
            pause,
        })
    }

    /// Point level select's "continue" at level `index`.
    pub fn set_starting_level(&self, runner: &mut Runner, index: usize) -> Result<(), FlowError> {
        let links = self.level_select_links(index)?;
        runner.rebind_links(self.level_select, links)
    }

    fn level_select_links(&self, index: usize) -> Result<Vec<Link>, FlowError> {
        let level = self.levels.get(index).ok_or(FlowError::UnknownLevel {
            index,
            count: self.levels.len(),
        })?;
        Ok(vec![
            Link::on_event(&self.events.proceed, level.load),
            Link::on_event(&self.events.back, self.main_menu),
        ])
    }

    /// State to start the runner in.
    pub fn entry(&self) -> StateId {
        self.splash
    }

    /// Delay between the splash screen and the main menu.
    pub fn splash_delay(&self) -> StateId {
        self.splash_delay
    }

    /// Main menu state.
    pub fn main_menu(&self) -> StateId {
        self.main_menu
    }

    /// Level select state.
    pub fn level_select(&self) -> StateId {
        self.level_select
    }

    /// States of level `index`, if it exists.
    pub fn level(&self, index: usize) -> Option<&LevelStates> {
        self.levels.get(index)
    }

    /// Number of levels in the flow.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Events the flow's links watch.
    pub fn events(&self) -> &FlowEvents {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing::ScriptedBackend;

    fn collaborators(config: &SequenceConfig) -> Collaborators {
        Collaborators {
            notifier: Arc::new(SilentNotifier),
            progress: Arc::new(MemoryProgress::default()),
            resources: config.resource_controller(ScriptedBackend::new(1)),
        }
    }

    fn config(levels: &[&str]) -> SequenceConfig {
        SequenceConfig {
            levels: levels.iter().map(|&l| LevelSource::from(l)).collect(),
            ..SequenceConfig::default()
        }
    }

    #[test]
    fn builds_states_per_level() {
        let config = config(&["one", "two"]);
        let mut graph = StateGraph::new();
        let sequence =
            GameSequence::build(&mut graph, &config, FlowEvents::new(), &collaborators(&config))
                .unwrap();

        // 4 menu states, 7 per level, 1 closing unload
        assert_eq!(graph.len(), 4 + 2 * 7 + 1);
        assert_eq!(sequence.level_count(), 2);
        assert_eq!(graph.name_of(sequence.entry()), "splash");
        assert_eq!(
            graph.find("load:two"),
            sequence.level(1).map(|level| level.load)
        );
        assert!(crate::builder::graph_violations(&graph).is_empty());
    }

    #[test]
    fn level_select_initially_targets_first_level() {
        let config = config(&["one", "two"]);
        let mut graph = StateGraph::new();
        let sequence =
            GameSequence::build(&mut graph, &config, FlowEvents::new(), &collaborators(&config))
                .unwrap();

        let targets: Vec<StateId> = graph
            .get(sequence.level_select())
            .unwrap()
            .links()
            .map(Link::target)
            .collect();
        assert_eq!(
            targets,
            vec![sequence.level(0).unwrap().load, sequence.main_menu()]
        );
    }

    #[test]
    fn starting_level_out_of_range_is_rejected() {
        let config = config(&["one"]);
        let mut graph = StateGraph::new();
        let sequence =
            GameSequence::build(&mut graph, &config, FlowEvents::new(), &collaborators(&config))
                .unwrap();
        let mut runner = Runner::new(graph, crate::core::GameClock::new());

        assert_eq!(
            sequence.set_starting_level(&mut runner, 3).unwrap_err(),
            FlowError::UnknownLevel { index: 3, count: 1 }
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: SequenceConfig = serde_json::from_str(r#"{ "levels": ["a"] }"#).unwrap();
        assert_eq!(config.splash_delay, 2.0);
        assert_eq!(config.base_resource, "boot");
        assert_eq!(config.levels, vec![LevelSource::from("a")]);
    }

    #[test]
    fn definition_levels_build_create_states() {
        let config = SequenceConfig {
            levels: vec![
                LevelSource::from("one"),
                LevelSource::Definition {
                    definition: "runner-2".into(),
                },
            ],
            ..SequenceConfig::default()
        };
        let mut graph = StateGraph::new();
        let sequence =
            GameSequence::build(&mut graph, &config, FlowEvents::new(), &collaborators(&config))
                .unwrap();

        let created = sequence.level(1).unwrap().load;
        assert_eq!(graph.find("create:runner-2"), Some(created));
        assert_eq!(
            graph.get(created).unwrap().body().resource_id(),
            Some("runner-2")
        );
    }

    #[test]
    fn config_accepts_both_level_kinds() {
        let config: SequenceConfig = serde_json::from_str(
            r#"{ "levels": ["intro", { "definition": "runner-2" }] }"#,
        )
        .unwrap();
        assert_eq!(
            config.levels,
            vec![
                LevelSource::from("intro"),
                LevelSource::Definition {
                    definition: "runner-2".into()
                },
            ]
        );
        assert_eq!(config.levels[1].resource_id(), "runner-2");
    }
}
