//! Per-kind event rate limiting.
//!
//! Each limiter counts the events of one kind over a one-minute window.
//! The window is measured at event-arrival instants — no background timer:
//! the first event after a window has elapsed starts a new one. Crossing
//! the threshold emits exactly one diagnostic per window, attributed to the
//! agent source; a latch lets that diagnostic itself pass through if it is
//! routed back into the same limiter.

use parking_lot::Mutex;
use tracing::debug;

use crate::telemetry::{DiagnosticReporter, ErrorSource, RawDiagnostic};
use crate::time::{Clocks, ONE_MINUTE, RelativeTime};

#[derive(Debug, Default)]
struct LimiterState {
    event_count: usize,
    window_start: Option<RelativeTime>,
    allow_next_event: bool,
}

/// Rate limiter for one event kind.
pub struct EventRateLimiter {
    event_kind: String,
    threshold: usize,
    on_limit_reached: DiagnosticReporter,
    state: Mutex<LimiterState>,
}

impl EventRateLimiter {
    /// Limiter allowing `threshold` events of `event_kind` per minute.
    #[must_use]
    pub fn new(event_kind: impl Into<String>, threshold: usize, on_limit_reached: DiagnosticReporter) -> Self {
        Self {
            event_kind: event_kind.into(),
            threshold,
            on_limit_reached,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// Record one event arrival at `clocks` and report whether it must be
    /// suppressed.
    ///
    /// The diagnostic callback is invoked with no internal lock held, so it
    /// may synchronously publish events of its own.
    pub fn is_limit_reached(&self, clocks: Clocks) -> bool {
        let diagnostic = {
            let mut state = self.state.lock();
            let now = clocks.relative;
            match state.window_start {
                None => state.window_start = Some(now),
                Some(start) if now.duration_since(start) >= ONE_MINUTE => {
                    state.window_start = Some(now);
                    state.event_count = 0;
                }
                Some(_) => {}
            }
            state.event_count += 1;

            if state.event_count <= self.threshold || state.allow_next_event {
                state.allow_next_event = false;
                return false;
            }
            if state.event_count == self.threshold + 1 {
                state.allow_next_event = true;
                Some(RawDiagnostic {
                    clocks,
                    message: format!(
                        "Reached max number of {}s by minute: {}",
                        self.event_kind, self.threshold
                    ),
                    source: ErrorSource::Agent,
                    stack: None,
                })
            } else {
                None
            }
        };

        if let Some(diagnostic) = diagnostic {
            debug!(kind = %self.event_kind, threshold = self.threshold, "event rate limit reached");
            (self.on_limit_reached)(diagnostic);
            self.state.lock().allow_next_event = false;
        }
        true
    }
}

impl std::fmt::Debug for EventRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRateLimiter")
            .field("event_kind", &self.event_kind)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
