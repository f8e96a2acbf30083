use jiff::{SignedDuration, Timestamp};
use std::sync::{Arc, Mutex};

pub trait Clock: Send + Sync + 'static {
    /// Returns the current time of the clock
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same instant, so a test can hand one copy to a
/// service and keep another to drive time forward.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            inner: Arc::new(Mutex::new(now)),
        }
    }

    /// Moves the clock to `now`, backwards or forwards.
    pub fn set(&self, now: Timestamp) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// Moves the clock forward by `by`, saturating at the end of time.
    pub fn advance(&self, by: SignedDuration) {
        let mut now = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *now = now.checked_add(by).unwrap_or(Timestamp::MAX);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Whether callers may override the clock per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeMode {
    /// Overrides are ignored.
    #[default]
    Wall,
    /// Overrides take precedence over the clock. Test deployments only.
    Deterministic,
}

/// The time source handed to the paste store.
///
/// Wraps a [`Clock`] and decides whether a caller-supplied instant
/// replaces it.
#[derive(Debug, Clone)]
pub struct TimeSource<C = SystemClock> {
    clock: C,
    mode: TimeMode,
}

impl TimeSource<SystemClock> {
    /// Wall-clock time, overrides ignored.
    pub fn system() -> Self {
        Self::new(SystemClock, TimeMode::Wall)
    }
}

impl Default for TimeSource<SystemClock> {
    fn default() -> Self {
        Self::system()
    }
}

impl<C: Clock> TimeSource<C> {
    pub fn new(clock: C, mode: TimeMode) -> Self {
        Self { clock, mode }
    }

    /// Returns the instant an operation should treat as "now".
    pub fn now(&self, override_at: Option<Timestamp>) -> Timestamp {
        match (self.mode, override_at) {
            (TimeMode::Deterministic, Some(at)) => at,
            _ => self.clock.now(),
        }
    }
}
