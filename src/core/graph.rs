//! Arena of flow states.
//!
//! States are addressed by [`StateId`]; links store ids rather than
//! references, so cyclic flows (gameplay ↔ pause) need no shared ownership.

use super::link::{Link, LinkId};
use super::state::{FlowState, StateId};
use crate::runner::FlowError;

/// The flow graph: states and their outgoing links.
///
/// # Example
///
/// ```rust
/// use gameflow::core::{FlowState, GameEvent, Link, StateGraph};
///
/// let back = GameEvent::new("back");
/// let mut graph = StateGraph::new();
/// let menu = graph.add_state(FlowState::plain("menu"));
/// let options = graph.add_state(FlowState::plain("options"));
///
/// graph.add_link(menu, Link::always(options)).unwrap();
/// graph.add_link(options, Link::on_event(&back, menu)).unwrap();
///
/// assert_eq!(graph.validate_links(menu).unwrap(), Some(options));
/// assert_eq!(graph.validate_links(options).unwrap(), None);
/// ```
#[derive(Debug, Default)]
pub struct StateGraph {
    states: Vec<FlowState>,
}

impl StateGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self { states: Vec::new() }
    }

    /// Add a state and return its id.
    pub fn add_state(&mut self, state: FlowState) -> StateId {
        self.states.push(state);
        StateId(self.states.len() - 1)
    }

    /// Check if `id` names a state of this graph.
    pub fn contains(&self, id: StateId) -> bool {
        id.0 < self.states.len()
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if the graph has no states.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Look up a state.
    pub fn get(&self, id: StateId) -> Result<&FlowState, FlowError> {
        self.states.get(id.0).ok_or(FlowError::UnknownState(id))
    }

    /// Look up a state mutably.
    pub fn get_mut(&mut self, id: StateId) -> Result<&mut FlowState, FlowError> {
        self.states.get_mut(id.0).ok_or(FlowError::UnknownState(id))
    }

    /// Debug name of a state, or `"?"` for an unknown id.
    pub fn name_of(&self, id: StateId) -> &str {
        self.states.get(id.0).map_or("?", FlowState::name)
    }

    /// First state with the given debug name.
    pub fn find(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|state| state.name() == name)
            .map(StateId)
    }

    /// States with their ids, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (StateId, &FlowState)> {
        self.states
            .iter()
            .enumerate()
            .map(|(index, state)| (StateId(index), state))
    }

    /// Append a link to `from`, rejecting targets outside this graph.
    pub fn add_link(&mut self, from: StateId, link: Link) -> Result<LinkId, FlowError> {
        self.check_target(from, &link)?;
        Ok(self.get_mut(from)?.add_link(link))
    }

    /// Remove and disarm one link of `from`.
    pub fn remove_link(&mut self, from: StateId, link: LinkId) -> Result<bool, FlowError> {
        Ok(self.get_mut(from)?.remove_link(link))
    }

    /// Disarm and drop every link of `from`.
    pub fn remove_all_links(&mut self, from: StateId) -> Result<(), FlowError> {
        self.get_mut(from)?.remove_all_links();
        Ok(())
    }

    /// Replace every link of `from` with `links`.
    ///
    /// All targets are checked before anything changes, so a rejected
    /// rebind leaves the old links in place. The new links are not armed.
    pub fn replace_links(&mut self, from: StateId, links: Vec<Link>) -> Result<(), FlowError> {
        for link in &links {
            self.check_target(from, link)?;
        }
        let state = self.get_mut(from)?;
        state.remove_all_links();
        for link in links {
            state.add_link(link);
        }
        Ok(())
    }

    /// First open link's target for state `id`.
    pub fn validate_links(&self, id: StateId) -> Result<Option<StateId>, FlowError> {
        Ok(self.get(id)?.validate_links())
    }

    /// Arm every link of state `id`.
    pub fn enable_links(&self, id: StateId) -> Result<(), FlowError> {
        self.get(id)?.enable_links();
        Ok(())
    }

    /// Disarm every link of state `id`.
    pub fn disable_links(&self, id: StateId) -> Result<(), FlowError> {
        self.get(id)?.disable_links();
        Ok(())
    }

    fn check_target(&self, from: StateId, link: &Link) -> Result<(), FlowError> {
        let target = link.target();
        if self.contains(target) {
            Ok(())
        } else {
            Err(FlowError::InvalidLinkTarget {
                from: self.name_of(from).to_string(),
                target,
            })
        }
    }
}
