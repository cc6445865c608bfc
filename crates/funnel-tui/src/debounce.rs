//! Trailing-edge debounce for search input.

use std::time::{Duration, Instant};

/// Quiet period after the last keystroke before a search runs.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Fires once after input has been quiet for `delay`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Record input at `now`, pushing the deadline back.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Whether the quiet period elapsed by `now`. Clears the pending state
    /// when it returns `true`.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Drop any pending fire.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}
