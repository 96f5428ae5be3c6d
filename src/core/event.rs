//! Broadcast events used to trigger flow transitions.
//!
//! A [`GameEvent`] is a cheap, cloneable handle to a shared listener list.
//! Collaborators (buttons, collision triggers, app focus notifications) raise
//! events; armed event links listen for them. Every clone of a handle refers
//! to the same event.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Receiver of event notifications.
///
/// Any `Fn(&GameEvent)` closure is a listener, which keeps ad-hoc
/// subscriptions short in tests and glue code.
pub trait EventListener: Send + Sync {
    /// Called synchronously from [`GameEvent::raise`].
    ///
    /// The event payload is readable for the duration of this call only.
    fn on_event_raised(&self, event: &GameEvent);
}

impl<F> EventListener for F
where
    F: Fn(&GameEvent) + Send + Sync,
{
    fn on_event_raised(&self, event: &GameEvent) {
        self(event)
    }
}

struct EventInner {
    name: String,
    listeners: Mutex<Vec<Arc<dyn EventListener>>>,
    payload: Mutex<Option<i64>>,
}

/// A named broadcast event with an optional integer payload.
///
/// Listeners are unique per event (identity is the `Arc` allocation) and are
/// notified in reverse registration order. After notification the payload
/// resets to `None`.
///
/// # Example
///
/// ```rust
/// use gameflow::core::{EventListener, GameEvent};
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use std::sync::Arc;
///
/// let picked = GameEvent::new("item-picked");
/// let seen = Arc::new(AtomicI64::new(0));
///
/// let sink = Arc::clone(&seen);
/// let listener: Arc<dyn EventListener> = Arc::new(move |event: &GameEvent| {
///     sink.store(event.payload().unwrap_or(-1), Ordering::SeqCst);
/// });
/// picked.add_listener(Arc::clone(&listener));
///
/// picked.raise_with(3);
/// assert_eq!(seen.load(Ordering::SeqCst), 3);
/// assert_eq!(picked.payload(), None);
/// ```
#[derive(Clone)]
pub struct GameEvent {
    inner: Arc<EventInner>,
}

impl GameEvent {
    /// Create a new event with no listeners.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(EventInner {
                name: name.into(),
                listeners: Mutex::new(Vec::new()),
                payload: Mutex::new(None),
            }),
        }
    }

    /// Name used for diagnostics.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Subscribe a listener. Adding a listener twice is a no-op.
    pub fn add_listener(&self, listener: Arc<dyn EventListener>) {
        let mut listeners = self.inner.listeners.lock();
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Unsubscribe a listener. Removing an unknown listener is a no-op.
    pub fn remove_listener(&self, listener: &Arc<dyn EventListener>) {
        self.inner
            .listeners
            .lock()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Check whether a listener is currently subscribed.
    pub fn has_listener(&self, listener: &Arc<dyn EventListener>) -> bool {
        self.inner
            .listeners
            .lock()
            .iter()
            .any(|l| Arc::ptr_eq(l, listener))
    }

    /// Number of subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Payload set by the current [`raise_with`](Self::raise_with) call, if any.
    pub fn payload(&self) -> Option<i64> {
        *self.inner.payload.lock()
    }

    /// Notify every listener without a payload.
    pub fn raise(&self) {
        self.fire(None);
    }

    /// Notify every listener with `payload` readable during the callbacks.
    pub fn raise_with(&self, payload: i64) {
        self.fire(Some(payload));
    }

    /// Whether two handles refer to the same event.
    pub fn same_event(&self, other: &GameEvent) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn fire(&self, payload: Option<i64>) {
        if payload.is_some() {
            *self.inner.payload.lock() = payload;
        }

        // Callbacks run without the lock held, so listeners may unsubscribe
        // themselves or others. Listeners removed mid-fire are skipped.
        let snapshot: Vec<Arc<dyn EventListener>> = self.inner.listeners.lock().clone();
        for listener in snapshot.iter().rev() {
            if self.has_listener(listener) {
                listener.on_event_raised(self);
            }
        }

        self.reset();
    }

    fn reset(&self) {
        *self.inner.payload.lock() = None;
    }
}

impl fmt::Debug for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameEvent")
            .field("name", &self.inner.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}
