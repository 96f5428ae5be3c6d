//! Loading policy: single active resource over a never-unloaded base.

use super::{AsyncOperation, LoadKind, OperationStatus, ResourceBackend};
use crate::runner::FlowError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Controller shared by every load/unload state of a graph.
pub type SharedResources = Arc<Mutex<ResourceController>>;

/// Reject ids that cannot name a resource.
pub fn validate_resource_id(id: &str) -> Result<(), FlowError> {
    if id.trim().is_empty() {
        return Err(FlowError::InvalidResourceId { id: id.to_string() });
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Stage {
    Unload(String),
    Load(String),
    Create(String),
}

impl Stage {
    fn resource(&self) -> &str {
        match self {
            Stage::Unload(id) | Stage::Load(id) | Stage::Create(id) => id,
        }
    }
}

/// A sequence of backend operations, started lazily one after another.
#[derive(Default)]
pub struct ResourceTask {
    pending: VecDeque<Stage>,
    running: Option<(Stage, Box<dyn AsyncOperation>)>,
}

impl ResourceTask {
    /// Whether every stage has completed.
    pub fn is_finished(&self) -> bool {
        self.pending.is_empty() && self.running.is_none()
    }
}

impl fmt::Debug for ResourceTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTask")
            .field("pending", &self.pending)
            .field("running", &self.running.as_ref().map(|(stage, _)| stage))
            .finish()
    }
}

/// Tracks the last loaded resource above a base that is never unloaded.
pub struct ResourceController {
    backend: Box<dyn ResourceBackend>,
    base: String,
    last: String,
}

impl ResourceController {
    /// Create a controller with only `base` loaded.
    pub fn new(backend: impl ResourceBackend + 'static, base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            backend: Box::new(backend),
            last: base.clone(),
            base,
        }
    }

    /// Wrap for sharing between load and unload states.
    pub fn shared(self) -> SharedResources {
        Arc::new(Mutex::new(self))
    }

    /// Resource that is never unloaded.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Most recently loaded or created resource, or the base.
    pub fn last_loaded(&self) -> &str {
        &self.last
    }

    /// Plan a load of `id`, unloading the current resource first.
    ///
    /// Fails before any backend operation starts if `id` is invalid.
    pub fn load(&mut self, id: &str) -> Result<ResourceTask, FlowError> {
        validate_resource_id(id)?;
        let mut task = self.unload_last();
        task.pending.push_back(Stage::Load(id.to_string()));
        Ok(task)
    }

    /// Plan the creation of a fresh, empty resource `id`, unloading the
    /// current resource first. The created resource becomes the last loaded.
    ///
    /// Fails before any backend operation starts if `id` is invalid.
    pub fn create_new(&mut self, id: &str) -> Result<ResourceTask, FlowError> {
        validate_resource_id(id)?;
        let mut task = self.unload_last();
        task.pending.push_back(Stage::Create(id.to_string()));
        Ok(task)
    }

    /// Begin `kind` for `id`: [`load`](Self::load) or [`create_new`](Self::create_new).
    pub fn begin(&mut self, kind: LoadKind, id: &str) -> Result<ResourceTask, FlowError> {
        match kind {
            LoadKind::Existing => self.load(id),
            LoadKind::Create => self.create_new(id),
        }
    }

    /// Plan an unload of the last resource. Empty when only the base is loaded.
    pub fn unload_last(&mut self) -> ResourceTask {
        let mut task = ResourceTask::default();
        if self.last != self.base {
            task.pending.push_back(Stage::Unload(self.last.clone()));
        }
        task
    }

    /// Advance `task`; `Ok(true)` once every stage has completed.
    pub fn poll(&mut self, task: &mut ResourceTask) -> Result<bool, FlowError> {
        loop {
            if task.running.is_none() {
                let Some(stage) = task.pending.pop_front() else {
                    return Ok(true);
                };
                debug!(stage = ?stage, "begin resource operation");
                let operation = match &stage {
                    Stage::Unload(id) => self.backend.begin_unload(id),
                    Stage::Load(id) => self.backend.begin_load(id),
                    Stage::Create(id) => self.backend.begin_create(id),
                };
                task.running = Some((stage, operation));
            }

            let Some((stage, operation)) = task.running.as_mut() else {
                continue;
            };
            match operation.poll() {
                OperationStatus::Pending => return Ok(false),
                OperationStatus::Complete => {
                    match stage {
                        Stage::Load(id) | Stage::Create(id) => self.last = id.clone(),
                        Stage::Unload(_) => self.last = self.base.clone(),
                    }
                    task.running = None;
                }
                OperationStatus::Failed(reason) => {
                    let resource = stage.resource().to_string();
                    warn!(resource = %resource, reason = %reason, "resource operation failed");
                    task.running = None;
                    task.pending.clear();
                    return Err(FlowError::OperationFailed { resource, reason });
                }
            }
        }
    }
}

impl fmt::Debug for ResourceController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceController")
            .field("base", &self.base)
            .field("last", &self.last)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing::{BackendCall, ScriptedBackend};

    fn drive(controller: &mut ResourceController, task: &mut ResourceTask) -> Result<usize, FlowError> {
        let mut polls = 0;
        loop {
            polls += 1;
            if controller.poll(task)? {
                return Ok(polls);
            }
        }
    }

    #[test]
    fn empty_or_blank_ids_are_rejected() {
        assert!(validate_resource_id("").is_err());
        assert!(validate_resource_id("   ").is_err());
        assert!(validate_resource_id("level-1").is_ok());
    }

    #[test]
    fn first_load_skips_unloading_base() {
        let backend = ScriptedBackend::new(1);
        let calls = backend.calls();
        let mut controller = ResourceController::new(backend, "boot");

        let mut task = controller.load("level-1").unwrap();
        drive(&mut controller, &mut task).unwrap();

        assert_eq!(*calls.lock(), vec![BackendCall::Load("level-1".into())]);
        assert_eq!(controller.last_loaded(), "level-1");
        assert!(task.is_finished());
    }

    #[test]
    fn second_load_unloads_previous_first() {
        let backend = ScriptedBackend::new(2);
        let calls = backend.calls();
        let mut controller = ResourceController::new(backend, "boot");

        let mut first = controller.load("level-1").unwrap();
        drive(&mut controller, &mut first).unwrap();
        let mut second = controller.load("level-2").unwrap();
        let polls = drive(&mut controller, &mut second).unwrap();

        assert_eq!(polls, 3);
        assert_eq!(
            *calls.lock(),
            vec![
                BackendCall::Load("level-1".into()),
                BackendCall::Unload("level-1".into()),
                BackendCall::Load("level-2".into()),
            ]
        );
    }

    #[test]
    fn unload_last_returns_to_base() {
        let mut controller = ResourceController::new(ScriptedBackend::new(1), "boot");
        let mut task = controller.load("level-1").unwrap();
        drive(&mut controller, &mut task).unwrap();

        let mut unload = controller.unload_last();
        drive(&mut controller, &mut unload).unwrap();

        assert_eq!(controller.last_loaded(), "boot");
        assert!(controller.unload_last().is_finished());
    }

    #[test]
    fn create_new_unloads_previous_then_creates() {
        let backend = ScriptedBackend::new(1);
        let calls = backend.calls();
        let mut controller = ResourceController::new(backend, "boot");

        let mut first = controller.load("level-1").unwrap();
        drive(&mut controller, &mut first).unwrap();
        let mut created = controller.begin(LoadKind::Create, "generated-2").unwrap();
        drive(&mut controller, &mut created).unwrap();

        assert_eq!(
            *calls.lock(),
            vec![
                BackendCall::Load("level-1".into()),
                BackendCall::Unload("level-1".into()),
                BackendCall::Create("generated-2".into()),
            ]
        );
        assert_eq!(controller.last_loaded(), "generated-2");
    }

    #[test]
    fn create_new_rejects_blank_id_before_unloading() {
        let backend = ScriptedBackend::new(1);
        let calls = backend.calls();
        let mut controller = ResourceController::new(backend, "boot");
        let mut first = controller.load("level-1").unwrap();
        drive(&mut controller, &mut first).unwrap();

        let err = controller.create_new("").unwrap_err();

        assert!(matches!(err, FlowError::InvalidResourceId { .. }));
        assert_eq!(calls.lock().len(), 1);
        assert_eq!(controller.last_loaded(), "level-1");
    }

    #[test]
    fn failed_operation_surfaces_error() {
        let backend = ScriptedBackend::new(1).failing_on("broken");
        let mut controller = ResourceController::new(backend, "boot");
        let mut task = controller.load("broken").unwrap();

        let err = drive(&mut controller, &mut task).unwrap_err();

        assert!(matches!(err, FlowError::OperationFailed { ref resource, .. } if resource == "broken"));
        assert_eq!(controller.last_loaded(), "boot");
    }
}
