//! Asynchronous resource operations consumed by load and unload states.
//!
//! The engine does not know what a resource is. A [`ResourceBackend`] starts
//! operations and hands back [`AsyncOperation`]s that the runner polls once
//! per tick. [`ResourceController`] layers the flow's loading policy on top:
//! one resource is loaded at a time, and a designated base resource is never
//! unloaded.

mod controller;
pub mod testing;

use serde::{Deserialize, Serialize};

pub use controller::{validate_resource_id, ResourceController, ResourceTask, SharedResources};

/// Progress reported by a polled operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Complete,
    Failed(String),
}

/// How a load state brings its resource in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadKind {
    /// Load a stored resource.
    #[default]
    Existing,
    /// Create a fresh, empty resource to be populated by the caller.
    Create,
}

/// An in-flight operation, completed by repeated polling.
pub trait AsyncOperation: Send {
    /// Advance the operation and report its status.
    fn poll(&mut self) -> OperationStatus;
}

/// Host integration that begins resource operations.
///
/// Ids passed here have already been validated as non-empty.
pub trait ResourceBackend: Send {
    /// Load the existing resource `id` and make it current.
    fn begin_load(&mut self, id: &str) -> Box<dyn AsyncOperation>;

    /// Unload the resource `id`.
    fn begin_unload(&mut self, id: &str) -> Box<dyn AsyncOperation>;

    /// Create an empty resource named `id` and make it current.
    fn begin_create(&mut self, id: &str) -> Box<dyn AsyncOperation>;
}
