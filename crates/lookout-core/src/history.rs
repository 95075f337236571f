//! Time-indexed context history with bounded retention.
//!
//! A [`ValueHistory`] is an append-only log of values, each valid over a
//! half-open interval `[start_time, end_time)` where `end_time` is unset
//! while the entry is still active. Lookups scan newest-first so
//! overlapping entries favour recency. Entries whose closed interval ended
//! more than the expire delay before the latest accessed time are evicted
//! lazily from the front of the deque; there is no timer.

use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::time::RelativeTime;

/// One value with its validity interval.
#[derive(Debug)]
pub struct HistoryEntry<T> {
    value: T,
    start_time: RelativeTime,
    end_time: OnceLock<RelativeTime>,
}

impl<T> HistoryEntry<T> {
    /// The stored value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Start of the validity interval.
    #[must_use]
    pub fn start_time(&self) -> RelativeTime {
        self.start_time
    }

    /// End of the validity interval, `None` while the entry is active.
    #[must_use]
    pub fn end_time(&self) -> Option<RelativeTime> {
        self.end_time.get().copied()
    }

    /// Close the interval. Closing an already closed entry is a no-op.
    pub fn close(&self, end_time: RelativeTime) {
        let _ = self.end_time.set(end_time);
    }

    fn is_active(&self) -> bool {
        self.end_time.get().is_none()
    }

    fn contains(&self, time: RelativeTime) -> bool {
        self.start_time <= time && time <= self.end_time().unwrap_or(RelativeTime::MAX)
    }
}

/// Append-only, time-indexed store of context snapshots.
#[derive(Debug)]
pub struct ValueHistory<T> {
    entries: VecDeque<Arc<HistoryEntry<T>>>,
    expire_delay: Duration,
    latest_access: RelativeTime,
}

impl<T> ValueHistory<T> {
    /// History evicting entries closed more than `expire_delay` before the
    /// latest accessed time.
    #[must_use]
    pub fn new(expire_delay: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            expire_delay,
            latest_access: RelativeTime::ZERO,
        }
    }

    /// Append a value active from `start_time`. The returned handle closes
    /// the entry.
    ///
    /// Entries must be appended with non-decreasing `start_time`.
    pub fn add(&mut self, value: T, start_time: RelativeTime) -> Arc<HistoryEntry<T>> {
        self.touch(start_time);
        let entry = Arc::new(HistoryEntry {
            value,
            start_time,
            end_time: OnceLock::new(),
        });
        self.entries.push_back(Arc::clone(&entry));
        entry
    }

    /// Close the most recent active entry, if any.
    pub fn close_active(&mut self, end_time: RelativeTime) {
        if let Some(entry) = self.entries.iter().rev().find(|entry| entry.is_active()) {
            entry.close(end_time);
        }
        self.touch(end_time);
    }

    /// Clear every entry without closing them.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    fn find_entry(&mut self, time: Option<RelativeTime>) -> Option<&Arc<HistoryEntry<T>>> {
        if let Some(time) = time {
            self.touch(time);
        }
        let time = time.unwrap_or(RelativeTime::MAX);
        self.entries.iter().rev().find(|entry| entry.contains(time))
    }

    /// Advance the access watermark and evict expired entries. Only leading
    /// closed entries are dropped, so eviction stays amortized O(1); an
    /// entry behind a still-active one is collected once that one closes.
    fn touch(&mut self, time: RelativeTime) {
        if time > self.latest_access {
            self.latest_access = time;
        }
        let Some(cutoff) = self.latest_access.checked_sub(self.expire_delay) else {
            return;
        };
        while let Some(front) = self.entries.front() {
            match front.end_time() {
                Some(end) if end < cutoff => {
                    let _ = self.entries.pop_front();
                }
                _ => break,
            }
        }
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> ValueHistory<T> {
    /// Value of the entry whose interval contains `time`; with `None`, the
    /// most recent active entry.
    pub fn find(&mut self, time: Option<RelativeTime>) -> Option<T> {
        self.find_entry(time).map(|entry| entry.value.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
