//! Feature flag evaluation contexts.
//!
//! Feature flag contexts follow the life of views: a context opens when a
//! view is created and closes when the view ends. Evaluations mutate the
//! open context in place rather than appending a new entry per evaluation,
//! keeping memory bounded.

use std::sync::Arc;

use parking_lot::Mutex;

use lookout_core::context::{Context, ContextValue};
use lookout_core::history::ValueHistory;
use lookout_core::lifecycle::{LifeCycle, LifecycleEvent, LifecycleEventKind};
use lookout_core::observable::Subscription;
use lookout_core::session::SESSION_TIME_OUT_DELAY;
use lookout_core::time::RelativeTime;

/// Feature flag entries expire with the session timeout.
pub const FEATURE_FLAG_CONTEXT_TIME_OUT_DELAY: std::time::Duration = SESSION_TIME_OUT_DELAY;

type SharedContext = Arc<Mutex<Context>>;
type SharedHistory = Arc<Mutex<ValueHistory<SharedContext>>>;

/// Point-in-time feature flag lookup, cheaply cloneable.
#[derive(Clone, Debug)]
pub struct FeatureFlagFinder {
    history: SharedHistory,
}

impl FeatureFlagFinder {
    /// Evaluations recorded on the view active at `start_time` (or now).
    #[must_use]
    pub fn find_evaluations(&self, start_time: Option<RelativeTime>) -> Option<Context> {
        self.history
            .lock()
            .find(start_time)
            .map(|context| context.lock().clone())
    }
}

/// The feature flag context tracker.
#[derive(Debug)]
pub struct FeatureFlagContexts {
    finder: FeatureFlagFinder,
    subscriptions: Vec<Subscription>,
}

impl FeatureFlagContexts {
    /// Evaluations recorded on the view active at `start_time` (or now).
    #[must_use]
    pub fn find_evaluations(&self, start_time: Option<RelativeTime>) -> Option<Context> {
        self.finder.find_evaluations(start_time)
    }

    /// Record one evaluation on the current view's context. Ignored when no
    /// view is active.
    pub fn add_evaluation(&self, key: impl Into<String>, value: ContextValue) {
        if let Some(context) = self.finder.history.lock().find(None) {
            let _ = context.lock().insert(key.into(), value);
        }
    }

    /// A detached finder for cross-crate consumers.
    #[must_use]
    pub fn finder(&self) -> FeatureFlagFinder {
        self.finder.clone()
    }

    /// Detach from the bus. Idempotent.
    pub fn stop(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

/// Start tracking feature flag contexts on the bus.
pub fn start_feature_flag_contexts(life_cycle: &LifeCycle) -> FeatureFlagContexts {
    let history: SharedHistory = Arc::new(Mutex::new(ValueHistory::new(FEATURE_FLAG_CONTEXT_TIME_OUT_DELAY)));

    let on_view_created = life_cycle.subscribe(LifecycleEventKind::ViewCreated, {
        let history = Arc::clone(&history);
        move |event| {
            let LifecycleEvent::ViewCreated(view) = event else {
                return;
            };
            let _ = history
                .lock()
                .add(Arc::new(Mutex::new(Context::new())), view.start_clocks.relative);
        }
    });

    let on_view_ended = life_cycle.subscribe(LifecycleEventKind::ViewEnded, {
        let history = Arc::clone(&history);
        move |event| {
            let LifecycleEvent::ViewEnded(view) = event else {
                return;
            };
            history.lock().close_active(view.end_clocks.relative);
        }
    });

    let on_session_renewed = life_cycle.subscribe(LifecycleEventKind::SessionRenewed, {
        let history = Arc::clone(&history);
        move |_| history.lock().reset()
    });

    FeatureFlagContexts {
        finder: FeatureFlagFinder { history },
        subscriptions: vec![on_view_created, on_view_ended, on_session_renewed],
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
