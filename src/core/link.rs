//! Links: evaluatable edges between flow states.
//!
//! A link belongs to the state it leaves from and names its target by
//! [`StateId`]. Unconditional links are always open. Event links open once
//! their event is raised while they are armed; arming and disarming both
//! clear that record.

use super::event::{EventListener, GameEvent};
use super::state::StateId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Identifier of a link within its owning state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub(crate) u64);

/// Listener half of an event link: a boolean "raised since armed" record.
#[derive(Debug, Default)]
struct EventWatch {
    raised: AtomicBool,
}

impl EventListener for EventWatch {
    fn on_event_raised(&self, _event: &GameEvent) {
        self.raised.store(true, Ordering::SeqCst);
    }
}

/// A directed edge to a candidate next state.
///
/// # Example
///
/// ```rust
/// use gameflow::core::{FlowState, GameEvent, Link, StateGraph};
///
/// let mut graph = StateGraph::new();
/// let menu = graph.add_state(FlowState::plain("menu"));
/// let play = graph.add_state(FlowState::plain("play"));
///
/// let start = GameEvent::new("start");
/// let link = Link::on_event(&start, play);
/// assert_eq!(link.validate(), None);
///
/// link.arm();
/// start.raise();
/// assert_eq!(link.validate(), Some(play));
///
/// link.disarm();
/// assert_eq!(link.validate(), None);
/// assert_eq!(Link::always(menu).validate(), Some(menu));
/// ```
pub enum Link {
    /// Always open.
    Always { target: StateId },
    /// Open once `event` is raised while armed.
    OnEvent {
        target: StateId,
        event: GameEvent,
        watch: EventWatchHandle,
    },
}

/// Opaque listener registered on the watched event while a link is armed.
pub struct EventWatchHandle {
    watch: Arc<EventWatch>,
    listener: Arc<dyn EventListener>,
}

impl EventWatchHandle {
    fn new() -> Self {
        let watch = Arc::new(EventWatch::default());
        let listener: Arc<dyn EventListener> = watch.clone();
        Self { watch, listener }
    }
}

impl Link {
    /// Link that is always open.
    pub fn always(target: StateId) -> Self {
        Link::Always { target }
    }

    /// Link that opens once `event` is raised while armed.
    pub fn on_event(event: &GameEvent, target: StateId) -> Self {
        Link::OnEvent {
            target,
            event: event.clone(),
            watch: EventWatchHandle::new(),
        }
    }

    /// State this link leads to.
    pub fn target(&self) -> StateId {
        match self {
            Link::Always { target } | Link::OnEvent { target, .. } => *target,
        }
    }

    /// Watched event, for event links.
    pub fn event(&self) -> Option<&GameEvent> {
        match self {
            Link::Always { .. } => None,
            Link::OnEvent { event, .. } => Some(event),
        }
    }

    /// Target state if the link is open.
    ///
    /// Polling does not consume the raised record; only arming and disarming
    /// clear it.
    pub fn validate(&self) -> Option<StateId> {
        match self {
            Link::Always { target } => Some(*target),
            Link::OnEvent { target, watch, .. } => {
                watch.watch.raised.load(Ordering::SeqCst).then_some(*target)
            }
        }
    }

    /// Start listening. No-op for unconditional links.
    pub fn arm(&self) {
        if let Link::OnEvent { event, watch, .. } = self {
            event.add_listener(Arc::clone(&watch.listener));
            watch.watch.raised.store(false, Ordering::SeqCst);
        }
    }

    /// Stop listening. No-op for unconditional links.
    pub fn disarm(&self) {
        if let Link::OnEvent { event, watch, .. } = self {
            event.remove_listener(&watch.listener);
            watch.watch.raised.store(false, Ordering::SeqCst);
        }
    }

    /// Whether the link is currently subscribed to its event.
    pub fn is_armed(&self) -> bool {
        match self {
            Link::Always { .. } => false,
            Link::OnEvent { event, watch, .. } => event.has_listener(&watch.listener),
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Always { target } => f.debug_struct("Always").field("target", target).finish(),
            Link::OnEvent { target, event, watch } => f
                .debug_struct("OnEvent")
                .field("target", target)
                .field("event", &event.name())
                .field("raised", &watch.watch.raised.load(Ordering::SeqCst))
                .finish(),
        }
    }
}
