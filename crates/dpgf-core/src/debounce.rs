//! Quiescence-based debouncing over an injected clock
//!
//! Time is passed in by the caller (milliseconds in the browser, arbitrary
//! units in tests) so the debouncer itself never reads a clock or owns a
//! timer. The host schedules a wake-up at [`Debouncer::deadline`] and calls
//! [`Debouncer::poll`] when it fires.

/// Default quiet period before a search input is committed
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    interval: u64,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: u64,
}

impl<T> Debouncer<T> {
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Record a new value at `now`, replacing any pending one and restarting
    /// the quiet period
    pub fn push(&mut self, value: T, now: u64) {
        self.pending = Some(Pending {
            value,
            deadline: now.saturating_add(self.interval),
        });
    }

    /// Take the pending value if its quiet period has elapsed by `now`
    pub fn poll(&mut self, now: u64) -> Option<T> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// When the pending value becomes ready, if any
    pub fn deadline(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value without emitting it
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}
