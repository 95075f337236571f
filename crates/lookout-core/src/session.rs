//! Session lookup contract.
//!
//! Session persistence and expiry policy live outside the SDK core; event
//! assembly only needs to resolve "the tracked session at time T" through
//! this narrow interface.

use std::time::Duration;

use crate::ids::SessionId;
use crate::time::RelativeTime;

/// Sessions (and the context histories scoped by them) expire after four
/// hours without activity.
pub const SESSION_TIME_OUT_DELAY: Duration = Duration::from_secs(4 * 60 * 60);

/// Options for a session lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionLookupOptions {
    /// Also return a session that is no longer active.
    pub return_inactive: bool,
}

/// A session that was tracked at the queried time.
///
/// `id` is `None` when the session exists but is not sampled for tracking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedSession {
    /// Session identifier, when the session is sampled.
    pub id: Option<SessionId>,
}

/// Time-indexed session lookup, provided by the embedder.
pub trait SessionLookup: Send + Sync {
    /// The tracked session active at `start_time` (or now, when `None`).
    fn find_tracked_session(
        &self,
        start_time: Option<RelativeTime>,
        options: SessionLookupOptions,
    ) -> Option<TrackedSession>;
}
