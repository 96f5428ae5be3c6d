//! Injected game clock with a pausable time domain.
//!
//! The clock replaces a process-wide time scale: every runner owns (or
//! shares) a [`GameClock`], and the host advances it once per frame before
//! ticking. Pausing is reference counted through [`PauseToken`], so nested
//! pause regions cannot restore the scale early.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which time line a measurement is taken against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeDomain {
    /// Game time: scaled, frozen while paused.
    #[default]
    Scaled,
    /// Wall-clock time as reported by the host, never scaled.
    Unscaled,
}

#[derive(Debug)]
struct ClockState {
    time: f64,
    unscaled_time: f64,
    base_scale: f64,
    pause_depth: usize,
}

/// Shared, cloneable clock handle.
///
/// # Example
///
/// ```rust
/// use gameflow::core::GameClock;
///
/// let clock = GameClock::new();
/// clock.advance(0.5);
/// assert_eq!(clock.time(), 0.5);
///
/// let token = clock.pause();
/// clock.advance(0.5);
/// assert_eq!(clock.time(), 0.5);
/// assert_eq!(clock.unscaled_time(), 1.0);
///
/// drop(token);
/// assert_eq!(clock.scale(), 1.0);
/// ```
#[derive(Clone, Debug)]
pub struct GameClock {
    inner: Arc<Mutex<ClockState>>,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl GameClock {
    /// Clock at time zero with scale one.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockState {
                time: 0.0,
                unscaled_time: 0.0,
                base_scale: 1.0,
                pause_depth: 0,
            })),
        }
    }

    /// Scaled game time.
    pub fn time(&self) -> f64 {
        self.inner.lock().time
    }

    /// Host time, unaffected by scale and pauses.
    pub fn unscaled_time(&self) -> f64 {
        self.inner.lock().unscaled_time
    }

    /// Current time in `domain`.
    pub fn now(&self, domain: TimeDomain) -> f64 {
        match domain {
            TimeDomain::Scaled => self.time(),
            TimeDomain::Unscaled => self.unscaled_time(),
        }
    }

    /// Effective scale: zero while any pause token is alive.
    pub fn scale(&self) -> f64 {
        let state = self.inner.lock();
        if state.pause_depth > 0 {
            0.0
        } else {
            state.base_scale
        }
    }

    /// Set the scale used when no pause is active. Negative values clamp to zero.
    pub fn set_scale(&self, scale: f64) {
        self.inner.lock().base_scale = scale.max(0.0);
    }

    /// Whether any pause token is alive.
    pub fn is_paused(&self) -> bool {
        self.inner.lock().pause_depth > 0
    }

    /// Advance both time lines by `dt` host seconds.
    pub fn advance(&self, dt: f64) {
        let mut state = self.inner.lock();
        let scale = if state.pause_depth > 0 {
            0.0
        } else {
            state.base_scale
        };
        state.unscaled_time += dt;
        state.time += dt * scale;
    }

    /// Freeze the scaled time line until the returned token is dropped.
    pub fn pause(&self) -> PauseToken {
        self.inner.lock().pause_depth += 1;
        PauseToken {
            clock: self.clone(),
        }
    }
}

/// Keeps the clock paused while alive.
#[must_use = "the clock resumes as soon as the token is dropped"]
#[derive(Debug)]
pub struct PauseToken {
    clock: GameClock,
}

impl PauseToken {
    /// Resume explicitly. Equivalent to dropping the token.
    pub fn release(self) {}
}

impl Drop for PauseToken {
    fn drop(&mut self) {
        let mut state = self.clock.inner.lock();
        state.pause_depth = state.pause_depth.saturating_sub(1);
    }
}
