//! Ambient user history.
//!
//! Keeps a time-indexed history of user snapshots so late events are
//! attributed to the user that was set when they were observed. The history
//! resets on session renewal, but the ambient user itself is not
//! session-scoped: the current snapshot is re-opened at the renewal time.

use std::sync::Arc;

use parking_lot::Mutex;

use lookout_core::history::ValueHistory;
use lookout_core::lifecycle::{LifeCycle, LifecycleEventKind};
use lookout_core::observable::Subscription;
use lookout_core::session::SESSION_TIME_OUT_DELAY;
use lookout_core::time::{Clock, RelativeTime};
use lookout_core::user::User;

/// User entries expire with the session timeout.
pub const USER_CONTEXT_TIME_OUT_DELAY: std::time::Duration = SESSION_TIME_OUT_DELAY;

#[derive(Debug)]
struct UserState {
    history: ValueHistory<User>,
    current: User,
}

/// The ambient user tracker.
#[derive(Debug)]
pub struct UserContexts {
    clock: Clock,
    state: Arc<Mutex<UserState>>,
    subscriptions: Vec<Subscription>,
}

impl UserContexts {
    /// Set the ambient user, closing the previous snapshot.
    pub fn set_user(&self, user: User) {
        let now = self.clock.relative_now();
        let mut state = self.state.lock();
        state.history.close_active(now);
        if !user.is_empty() {
            let _ = state.history.add(user.clone(), now);
        }
        state.current = user;
    }

    /// Clear the ambient user.
    pub fn clear_user(&self) {
        self.set_user(User::default());
    }

    /// The user active at `start_time` (or now, when `None`).
    #[must_use]
    pub fn find_user(&self, start_time: Option<RelativeTime>) -> Option<User> {
        self.state.lock().history.find(start_time)
    }

    /// Snapshot of the current user.
    #[must_use]
    pub fn current_user(&self) -> User {
        self.state.lock().current.clone()
    }

    /// Detach from the bus. Idempotent.
    pub fn stop(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

/// Start tracking the ambient user.
pub fn start_user_contexts(clock: Clock, life_cycle: &LifeCycle) -> UserContexts {
    let state = Arc::new(Mutex::new(UserState {
        history: ValueHistory::new(USER_CONTEXT_TIME_OUT_DELAY),
        current: User::default(),
    }));

    let on_session_renewed = life_cycle.subscribe(LifecycleEventKind::SessionRenewed, {
        let state = Arc::clone(&state);
        move |_| {
            let now = clock.relative_now();
            let mut state = state.lock();
            state.history.reset();
            let current = state.current.clone();
            if !current.is_empty() {
                let _ = state.history.add(current, now);
            }
        }
    });

    UserContexts {
        clock,
        state,
        subscriptions: vec![on_session_renewed],
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
