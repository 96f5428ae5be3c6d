//! In-memory backend for exercising load and unload states.

use super::{AsyncOperation, OperationStatus, ResourceBackend};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// A call made against [`ScriptedBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendCall {
    Load(String),
    Unload(String),
    Create(String),
}

/// Shared record of backend calls, in order.
pub type CallLog = Arc<Mutex<Vec<BackendCall>>>;

/// Backend whose operations complete after a fixed number of polls.
///
/// Ids registered with [`failing_on`](Self::failing_on) fail on their first poll.
#[derive(Debug)]
pub struct ScriptedBackend {
    polls_to_complete: u32,
    failing: HashSet<String>,
    calls: CallLog,
}

impl ScriptedBackend {
    /// Backend whose operations complete on poll number `polls_to_complete`.
    pub fn new(polls_to_complete: u32) -> Self {
        Self {
            polls_to_complete,
            failing: HashSet::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make every operation on `id` fail.
    pub fn failing_on(mut self, id: impl Into<String>) -> Self {
        self.failing.insert(id.into());
        self
    }

    /// Handle to the call log; stays valid after the backend is moved.
    pub fn calls(&self) -> CallLog {
        Arc::clone(&self.calls)
    }

    fn operation(&self, id: &str) -> Box<dyn AsyncOperation> {
        let failure = self
            .failing
            .contains(id)
            .then(|| format!("scripted failure for '{id}'"));
        Box::new(ScriptedOperation {
            remaining: self.polls_to_complete,
            failure,
        })
    }
}

impl ResourceBackend for ScriptedBackend {
    fn begin_load(&mut self, id: &str) -> Box<dyn AsyncOperation> {
        self.calls.lock().push(BackendCall::Load(id.to_string()));
        self.operation(id)
    }

    fn begin_unload(&mut self, id: &str) -> Box<dyn AsyncOperation> {
        self.calls.lock().push(BackendCall::Unload(id.to_string()));
        self.operation(id)
    }

    fn begin_create(&mut self, id: &str) -> Box<dyn AsyncOperation> {
        self.calls.lock().push(BackendCall::Create(id.to_string()));
        self.operation(id)
    }
}

struct ScriptedOperation {
    remaining: u32,
    failure: Option<String>,
}

impl AsyncOperation for ScriptedOperation {
    fn poll(&mut self) -> OperationStatus {
        if let Some(reason) = self.failure.take() {
            return OperationStatus::Failed(reason);
        }
        if self.remaining <= 1 {
            self.remaining = 0;
            OperationStatus::Complete
        } else {
            self.remaining -= 1;
            OperationStatus::Pending
        }
    }
}
