//! Whole-graph validation that reports every violation at once.
//!
//! Uses Stillwater's `Validation` to accumulate ALL problems in a single
//! pass instead of stopping at the first malformed link.

use crate::core::{StateGraph, StateId};
use crate::resources::validate_resource_id;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// A configuration error found in a flow graph.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphViolation {
    #[error("State '{state}' links to {target}, which is not in the graph")]
    DanglingLinkTarget { state: String, target: StateId },

    #[error("Load state '{state}' has an empty resource id")]
    EmptyResourceId { state: String },
}

/// Check every state and link of `graph`.
pub fn validate_graph(graph: &StateGraph) -> Validation<(), NonEmptyVec<GraphViolation>> {
    let mut checks: Vec<Validation<(), NonEmptyVec<GraphViolation>>> = Vec::new();

    for (_, state) in graph.iter() {
        for link in state.links() {
            let target = link.target();
            let check = if graph.contains(target) {
                Validation::success(())
            } else {
                Validation::fail(GraphViolation::DanglingLinkTarget {
                    state: state.name().to_string(),
                    target,
                })
            };
            checks.push(check);
        }

        if let Some(resource) = state.body().resource_id() {
            let check = if validate_resource_id(resource).is_ok() {
                Validation::success(())
            } else {
                Validation::fail(GraphViolation::EmptyResourceId {
                    state: state.name().to_string(),
                })
            };
            checks.push(check);
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

/// Collect violations into a plain list; empty when the graph is valid.
pub fn graph_violations(graph: &StateGraph) -> Vec<GraphViolation> {
    match validate_graph(graph) {
        Validation::Success(_) => Vec::new(),
        Validation::Failure(errors) => errors.iter().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FlowState, Link};
    use crate::resources::testing::ScriptedBackend;
    use crate::resources::ResourceController;

    #[test]
    fn valid_graph_passes() {
        let mut graph = StateGraph::new();
        let a = graph.add_state(FlowState::plain("a"));
        let b = graph.add_state(FlowState::plain("b"));
        graph.add_link(a, Link::always(b)).unwrap();

        assert!(validate_graph(&graph).is_success());
        assert!(graph_violations(&graph).is_empty());
    }

    #[test]
    fn validation_accumulates_all_violations() {
        let resources = ResourceController::new(ScriptedBackend::new(1), "boot").shared();
        let mut graph = StateGraph::new();

        let mut orphan = FlowState::plain("orphan");
        orphan.add_link(Link::always(StateId(40)));
        orphan.add_link(Link::always(StateId(41)));
        graph.add_state(orphan);
        graph.add_state(FlowState::load("level", &resources, " "));

        let violations = graph_violations(&graph);

        assert_eq!(violations.len(), 3);
        assert!(violations.contains(&GraphViolation::EmptyResourceId {
            state: "level".into()
        }));
        assert!(violations
            .iter()
            .any(|v| matches!(v, GraphViolation::DanglingLinkTarget { target, .. } if *target == StateId(41))));
    }
}
