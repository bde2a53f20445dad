//! Per-key window counter state.

use chrono::{DateTime, Utc};

/// Counted bucket for one key in one time window.
///
/// The count is only meaningful relative to `window_start`: a counter
/// whose window predates the current one is stale and treated as zero
/// by the limiter before acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_getters::Getters)]
pub struct WindowCounter {
    /// Start of the window this count belongs to
    window_start: DateTime<Utc>,
    /// Events observed since `window_start`
    count: u32,
}

impl WindowCounter {
    /// Open a fresh counter with one observed event.
    pub fn first(window_start: DateTime<Utc>) -> Self {
        Self {
            window_start,
            count: 1,
        }
    }

    /// True when this counter's window predates `current_window`.
    pub fn is_stale(&self, current_window: DateTime<Utc>) -> bool {
        self.window_start < current_window
    }

    /// Reset to a fresh window with one observed event.
    pub fn roll_over(&mut self, window_start: DateTime<Utc>) {
        self.window_start = window_start;
        self.count = 1;
    }

    /// Count one more event.
    pub fn increment(&mut self) {
        self.count += 1;
    }
}
