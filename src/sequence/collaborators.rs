//! Collaborators the game flow notifies or consults.

use crate::core::GameEvent;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

/// Sink for flow notifications (show a screen, switch music).
///
/// Called synchronously from inside a runner tick; implementations must not
/// drive the runner themselves.
pub trait FlowNotifier: Send + Sync {
    fn splash_shown(&self) {}

    fn main_menu_shown(&self) {}

    fn level_select_shown(&self) {}

    /// A definition-based level's empty resource is current and ready to
    /// be populated.
    fn level_created(&self, _level: usize) {}

    fn gameplay_started(&self, _level: usize) {}

    fn level_won(&self, _level: usize) {}

    fn level_lost(&self, _level: usize) {}

    fn game_paused(&self, _level: usize) {}
}

/// Notifier that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentNotifier;

impl FlowNotifier for SilentNotifier {}

/// Stores how far the player has progressed through the levels.
pub trait ProgressStore: Send + Sync {
    /// Index of the furthest unlocked level.
    fn level_progress(&self) -> usize;

    /// Record `level` as the furthest unlocked level.
    fn set_level_progress(&self, level: usize);
}

/// Process-local progress store.
#[derive(Debug, Default)]
pub struct MemoryProgress {
    level: AtomicUsize,
}

impl MemoryProgress {
    /// Store starting with `level` unlocked.
    pub fn new(level: usize) -> Self {
        Self {
            level: AtomicUsize::new(level),
        }
    }
}

impl ProgressStore for MemoryProgress {
    fn level_progress(&self) -> usize {
        self.level.load(Ordering::SeqCst)
    }

    fn set_level_progress(&self, level: usize) {
        self.level.store(level, Ordering::SeqCst);
    }
}

/// Unlock the next level when the furthest unlocked one is won.
pub(crate) fn record_win(progress: &dyn ProgressStore, level: usize, level_count: usize) {
    let current = progress.level_progress();
    if level == current && level + 1 < level_count {
        progress.set_level_progress(current + 1);
        debug!(level = current + 1, "level unlocked");
    }
}

/// Turns host focus and pause notifications into a pause event.
///
/// The host must call these methods on the thread that ticks the runner.
#[derive(Debug)]
pub struct AppPauseDetector {
    pause_event: GameEvent,
    paused: AtomicBool,
}

impl AppPauseDetector {
    /// Detector that raises `pause_event` when the app pauses.
    pub fn new(pause_event: &GameEvent) -> Self {
        Self {
            pause_event: pause_event.clone(),
            paused: AtomicBool::new(false),
        }
    }

    /// Whether the last notification left the app paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Host focus notification; losing focus pauses.
    pub fn on_focus_changed(&self, has_focus: bool) {
        self.set_paused(!has_focus);
    }

    /// Host pause notification.
    pub fn on_pause_changed(&self, paused: bool) {
        self.set_paused(paused);
    }

    fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
        if paused {
            self.pause_event.raise();
        }
    }
}
