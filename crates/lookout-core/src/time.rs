//! Millisecond time model for the SDK.
//!
//! Two time axes flow through the system:
//!
//! - [`TimeStamp`]: milliseconds since the unix epoch, used on finalized
//!   events.
//! - [`RelativeTime`]: milliseconds since the SDK time origin, used for
//!   point-in-time lookups in the context histories.
//!
//! [`Clock`] derives both from a [`tokio::time::Instant`] origin, so every
//! timer and timestamp in the SDK honours `tokio::time::pause` in tests.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// One second.
pub const ONE_SECOND: Duration = Duration::from_secs(1);
/// One minute.
pub const ONE_MINUTE: Duration = Duration::from_secs(60);

/// Milliseconds since the unix epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeStamp(u64);

impl TimeStamp {
    /// Build from a millisecond count.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Millisecond count since the unix epoch.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// This timestamp shifted forward by `duration`.
    #[must_use]
    pub fn add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration_millis(duration)))
    }

    /// Elapsed time since `earlier`, saturating to zero.
    #[must_use]
    pub fn duration_since(self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

/// Milliseconds since the SDK time origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelativeTime(u64);

impl RelativeTime {
    /// The time origin itself.
    pub const ZERO: Self = Self(0);
    /// The end of time, used as the open bound of validity intervals.
    pub const MAX: Self = Self(u64::MAX);

    /// Build from a millisecond count.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Millisecond count since the time origin.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// This instant shifted forward by `duration`.
    #[must_use]
    pub fn add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration_millis(duration)))
    }

    /// This instant shifted back by `duration`, `None` before the origin.
    #[must_use]
    pub fn checked_sub(self, duration: Duration) -> Option<Self> {
        self.0.checked_sub(duration_millis(duration)).map(Self)
    }

    /// Elapsed time since `earlier`, saturating to zero.
    #[must_use]
    pub fn duration_since(self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

/// A point in time on both axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clocks {
    /// Milliseconds since the SDK time origin.
    pub relative: RelativeTime,
    /// Milliseconds since the unix epoch.
    pub timestamp: TimeStamp,
}

/// The SDK clock.
///
/// Captures an origin at construction and measures everything as an offset
/// from it via [`tokio::time::Instant`], which is frozen and advanced
/// deterministically under `tokio::time::pause`.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    origin_instant: Instant,
    origin_timestamp: TimeStamp,
}

impl Clock {
    /// Clock anchored at the current wall-clock time.
    #[must_use]
    pub fn system() -> Self {
        let now_millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        Self::with_origin(TimeStamp::from_millis(now_millis))
    }

    /// Clock anchored "now" at the given epoch timestamp.
    #[must_use]
    pub fn with_origin(origin_timestamp: TimeStamp) -> Self {
        Self {
            origin_instant: Instant::now(),
            origin_timestamp,
        }
    }

    /// Elapsed time since the origin.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.origin_instant.elapsed()
    }

    /// Current time on the relative axis.
    #[must_use]
    pub fn relative_now(&self) -> RelativeTime {
        RelativeTime::ZERO.add(self.elapsed())
    }

    /// Current time on the epoch axis.
    #[must_use]
    pub fn timestamp_now(&self) -> TimeStamp {
        self.origin_timestamp.add(self.elapsed())
    }

    /// Current time on both axes.
    #[must_use]
    pub fn clocks_now(&self) -> Clocks {
        let elapsed = self.elapsed();
        Clocks {
            relative: RelativeTime::ZERO.add(elapsed),
            timestamp: self.origin_timestamp.add(elapsed),
        }
    }

    /// Project an epoch timestamp onto the relative axis.
    #[must_use]
    pub fn relative_from_timestamp(&self, timestamp: TimeStamp) -> RelativeTime {
        RelativeTime::from_millis(timestamp.as_millis().saturating_sub(self.origin_timestamp.as_millis()))
    }

    /// Project a relative instant onto the epoch axis.
    #[must_use]
    pub fn timestamp_from_relative(&self, relative: RelativeTime) -> TimeStamp {
        TimeStamp::from_millis(self.origin_timestamp.as_millis().saturating_add(relative.as_millis()))
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
