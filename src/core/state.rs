//! Flow states: lifecycle hooks, cooperative bodies, and owned links.
//!
//! A [`FlowState`] is a node in a [`StateGraph`](super::StateGraph). Each
//! activation runs `enter`, then steps the body once per runner tick until it
//! reports [`Step::Done`], and finally runs `exit` when a link resolves.
//! Bodies never block: waiting (on time or on a resource operation) is a
//! [`Step::Yield`] that the runner resumes on its next tick.

use super::clock::{GameClock, PauseToken, TimeDomain};
use super::link::{Link, LinkId};
use crate::resources::{validate_resource_id, LoadKind, ResourceTask, SharedResources};
use crate::runner::FlowError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Index of a state in its graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub(crate) usize);

impl StateId {
    /// Position in the owning graph.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of advancing a body by one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// More work remains; resume on the next tick.
    Yield,
    /// The body finished for this activation.
    Done,
}

/// Zero-argument notification invoked from inside a tick.
pub type Callback = Box<dyn FnMut() + Send>;

/// Services available to bodies while the runner steps them.
pub struct BodyContext<'a> {
    pub clock: &'a GameClock,
}

/// Extension point for bodies outside the built-in set.
///
/// Implementors must tolerate being abandoned between steps: once a link
/// resolves, `exit` runs and no further steps are delivered.
pub trait StateBody: Send {
    /// Reset per-activation progress.
    fn enter(&mut self, _ctx: &BodyContext<'_>) {}

    /// Advance by one tick.
    fn step(&mut self, ctx: &BodyContext<'_>) -> Result<Step, FlowError>;

    fn exit(&mut self, _ctx: &BodyContext<'_>) {}
}

/// Work a state performs while active.
pub enum Body {
    /// Completes on its first step, then invokes the callback.
    Plain { on_execute: Option<Callback> },
    /// Completes once `duration` has elapsed in `domain` since activation.
    Delay {
        duration: f64,
        domain: TimeDomain,
        started_at: Option<f64>,
    },
    /// Holds the clock paused between enter and exit. Completes on its first step.
    Pause {
        on_pause: Option<Callback>,
        token: Option<PauseToken>,
    },
    /// Loads (or creates) `resource` through the shared controller.
    Load {
        resource: String,
        kind: LoadKind,
        resources: SharedResources,
        on_loaded: Option<Callback>,
        task: Option<ResourceTask>,
    },
    /// Unloads the last loaded resource unless it is the controller's base.
    Unload {
        resources: SharedResources,
        task: Option<ResourceTask>,
    },
    Custom(Box<dyn StateBody>),
}

impl Body {
    /// Resource id requested by a load body.
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Body::Load { resource, .. } => Some(resource),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Body::Plain { .. } => "plain",
            Body::Delay { .. } => "delay",
            Body::Pause { .. } => "pause",
            Body::Load { .. } => "load",
            Body::Unload { .. } => "unload",
            Body::Custom(_) => "custom",
        }
    }

    fn enter(&mut self, ctx: &BodyContext<'_>) {
        match self {
            Body::Plain { .. } => {}
            Body::Delay {
                domain, started_at, ..
            } => {
                *started_at = Some(ctx.clock.now(*domain));
            }
            Body::Pause { on_pause, token } => {
                if token.is_none() {
                    *token = Some(ctx.clock.pause());
                }
                if let Some(callback) = on_pause {
                    callback();
                }
            }
            Body::Load { task, .. } | Body::Unload { task, .. } => {
                *task = None;
            }
            Body::Custom(body) => body.enter(ctx),
        }
    }

    fn step(&mut self, ctx: &BodyContext<'_>) -> Result<Step, FlowError> {
        match self {
            Body::Plain { on_execute } => {
                if let Some(callback) = on_execute {
                    callback();
                }
                Ok(Step::Done)
            }
            Body::Delay {
                duration,
                domain,
                started_at,
            } => {
                let now = ctx.clock.now(*domain);
                let start = *started_at.get_or_insert(now);
                if now - start < *duration {
                    Ok(Step::Yield)
                } else {
                    Ok(Step::Done)
                }
            }
            Body::Pause { .. } => Ok(Step::Done),
            Body::Load {
                resource,
                kind,
                resources,
                on_loaded,
                task,
            } => {
                let mut controller = resources.lock();
                if task.is_none() {
                    validate_resource_id(resource)?;
                    *task = Some(controller.begin(*kind, resource)?);
                }
                let finished = match task.as_mut() {
                    Some(running) => controller.poll(running)?,
                    None => true,
                };
                drop(controller);

                if !finished {
                    return Ok(Step::Yield);
                }
                *task = None;
                if let Some(callback) = on_loaded {
                    callback();
                }
                Ok(Step::Done)
            }
            Body::Unload { resources, task } => {
                let mut controller = resources.lock();
                let running = task.get_or_insert_with(|| controller.unload_last());
                if controller.poll(running)? {
                    *task = None;
                    Ok(Step::Done)
                } else {
                    Ok(Step::Yield)
                }
            }
            Body::Custom(body) => body.step(ctx),
        }
    }

    fn exit(&mut self, ctx: &BodyContext<'_>) {
        match self {
            Body::Pause { token, .. } => {
                if token.take().is_none() {
                    warn!("pause state exited without holding a pause token");
                }
            }
            Body::Load { task, resource, .. } => {
                if task.take().is_some() {
                    warn!(resource = %resource, "load abandoned before completion");
                }
            }
            Body::Unload { task, .. } => {
                if task.take().is_some() {
                    warn!("unload abandoned before completion");
                }
            }
            Body::Custom(body) => body.exit(ctx),
            Body::Plain { .. } | Body::Delay { .. } => {}
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Delay {
                duration, domain, ..
            } => f
                .debug_struct("Delay")
                .field("duration", duration)
                .field("domain", domain)
                .finish(),
            Body::Load { resource, kind, .. } => f
                .debug_struct("Load")
                .field("resource", resource)
                .field("kind", kind)
                .finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// A node of the flow graph.
///
/// Links are tested in insertion order; the first open link wins.
pub struct FlowState {
    name: String,
    body: Body,
    links: Vec<(LinkId, Link)>,
    next_link: u64,
}

impl FlowState {
    /// Create a state with no links.
    pub fn new(name: impl Into<String>, body: Body) -> Self {
        Self {
            name: name.into(),
            body,
            links: Vec::new(),
            next_link: 0,
        }
    }

    /// State whose body completes immediately.
    pub fn plain(name: impl Into<String>) -> Self {
        Self::new(name, Body::Plain { on_execute: None })
    }

    /// State whose body completes immediately and then invokes `on_execute`.
    pub fn with_callback<F>(name: impl Into<String>, on_execute: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::new(
            name,
            Body::Plain {
                on_execute: Some(Box::new(on_execute)),
            },
        )
    }

    /// State that waits `seconds` of game time.
    pub fn delay(name: impl Into<String>, seconds: f64) -> Self {
        Self::delay_in(name, seconds, TimeDomain::Scaled)
    }

    /// State that waits `seconds` measured in `domain`.
    pub fn delay_in(name: impl Into<String>, seconds: f64, domain: TimeDomain) -> Self {
        Self::new(
            name,
            Body::Delay {
                duration: seconds,
                domain,
                started_at: None,
            },
        )
    }

    /// State that pauses the clock while active and invokes `on_pause` on entry.
    pub fn pause<F>(name: impl Into<String>, on_pause: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::new(
            name,
            Body::Pause {
                on_pause: Some(Box::new(on_pause)),
                token: None,
            },
        )
    }

    /// State that loads `resource` and completes once it is loaded.
    pub fn load(
        name: impl Into<String>,
        resources: &SharedResources,
        resource: impl Into<String>,
    ) -> Self {
        Self::load_body(name, resources, resource, LoadKind::Existing, None)
    }

    /// Load state that invokes `on_loaded` after the resource finishes loading.
    pub fn load_then<F>(
        name: impl Into<String>,
        resources: &SharedResources,
        resource: impl Into<String>,
        on_loaded: F,
    ) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::load_body(
            name,
            resources,
            resource,
            LoadKind::Existing,
            Some(Box::new(on_loaded)),
        )
    }

    /// State that replaces the current resource with a fresh, empty one.
    pub fn create(
        name: impl Into<String>,
        resources: &SharedResources,
        resource: impl Into<String>,
    ) -> Self {
        Self::load_body(name, resources, resource, LoadKind::Create, None)
    }

    /// Create state that invokes `on_created` once the empty resource is
    /// current, typically to populate it.
    pub fn create_then<F>(
        name: impl Into<String>,
        resources: &SharedResources,
        resource: impl Into<String>,
        on_created: F,
    ) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::load_body(
            name,
            resources,
            resource,
            LoadKind::Create,
            Some(Box::new(on_created)),
        )
    }

    fn load_body(
        name: impl Into<String>,
        resources: &SharedResources,
        resource: impl Into<String>,
        kind: LoadKind,
        on_loaded: Option<Callback>,
    ) -> Self {
        Self::new(
            name,
            Body::Load {
                resource: resource.into(),
                kind,
                resources: resources.clone(),
                on_loaded,
                task: None,
            },
        )
    }

    /// State that unloads the last loaded resource.
    pub fn unload(name: impl Into<String>, resources: &SharedResources) -> Self {
        Self::new(
            name,
            Body::Unload {
                resources: resources.clone(),
                task: None,
            },
        )
    }

    /// State driven by a caller-supplied [`StateBody`].
    pub fn custom(name: impl Into<String>, body: impl StateBody + 'static) -> Self {
        Self::new(name, Body::Custom(Box::new(body)))
    }

    /// Debug name. Not used for lookup.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the state's body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Links in evaluation order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().map(|(_, link)| link)
    }

    /// Number of outgoing links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Append a link; it is tested after every link already present.
    pub fn add_link(&mut self, link: Link) -> LinkId {
        let id = LinkId(self.next_link);
        self.next_link += 1;
        self.links.push((id, link));
        id
    }

    /// Remove and disarm a link. Returns `false` if the id is unknown.
    pub fn remove_link(&mut self, id: LinkId) -> bool {
        match self.links.iter().position(|(link_id, _)| *link_id == id) {
            Some(index) => {
                let (_, link) = self.links.remove(index);
                link.disarm();
                true
            }
            None => false,
        }
    }

    /// Disarm and drop every link.
    pub fn remove_all_links(&mut self) {
        for (_, link) in self.links.drain(..) {
            link.disarm();
        }
    }

    /// First open link's target, in insertion order.
    pub fn validate_links(&self) -> Option<StateId> {
        self.links.iter().find_map(|(_, link)| link.validate())
    }

    /// Arm every link.
    pub fn enable_links(&self) {
        for (_, link) in &self.links {
            link.arm();
        }
    }

    /// Disarm every link.
    pub fn disable_links(&self) {
        for (_, link) in &self.links {
            link.disarm();
        }
    }

    pub(crate) fn enter(&mut self, ctx: &BodyContext<'_>) {
        debug!(state = %self.name, body = self.body.kind(), "enter");
        self.body.enter(ctx);
    }

    pub(crate) fn step(&mut self, ctx: &BodyContext<'_>) -> Result<Step, FlowError> {
        self.body.step(ctx)
    }

    pub(crate) fn exit(&mut self, ctx: &BodyContext<'_>) {
        debug!(state = %self.name, "exit");
        self.body.exit(ctx);
    }
}

impl fmt::Debug for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowState")
            .field("name", &self.name)
            .field("body", &self.body)
            .field("links", &self.links.len())
            .finish()
    }
}
