//! View context history.
//!
//! Keeps one [`ViewContext`] per tracked view so events can be attributed
//! to the view that was active when they were observed. A new view closes
//! the previous entry; a session renewal clears the history entirely.

use std::sync::Arc;

use parking_lot::Mutex;

use lookout_core::history::{HistoryEntry, ValueHistory};
use lookout_core::ids::ViewId;
use lookout_core::lifecycle::{LifeCycle, LifecycleEvent, LifecycleEventKind};
use lookout_core::observable::Subscription;
use lookout_core::session::SESSION_TIME_OUT_DELAY;
use lookout_core::time::{Clocks, RelativeTime};

/// View context entries expire with the session timeout.
pub const VIEW_CONTEXT_TIME_OUT_DELAY: std::time::Duration = SESSION_TIME_OUT_DELAY;

/// The view an event is attributed to.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewContext {
    /// View identifier.
    pub id: ViewId,
    /// View name, when one was computed.
    pub name: Option<String>,
    /// Service the view belongs to.
    pub service: Option<String>,
    /// Application version.
    pub version: Option<String>,
    /// When the view started.
    pub start_clocks: Clocks,
}

type SharedHistory = Arc<Mutex<ValueHistory<ViewContext>>>;

/// Point-in-time view lookup, cheaply cloneable.
#[derive(Clone, Debug)]
pub struct ViewContextFinder {
    history: SharedHistory,
}

impl ViewContextFinder {
    /// The view active at `start_time` (or now, when `None`).
    #[must_use]
    pub fn find_view(&self, start_time: Option<RelativeTime>) -> Option<ViewContext> {
        self.history.lock().find(start_time)
    }
}

/// The view context tracker.
#[derive(Debug)]
pub struct ViewContexts {
    finder: ViewContextFinder,
    subscriptions: Vec<Subscription>,
}

impl ViewContexts {
    /// The view active at `start_time` (or now, when `None`).
    #[must_use]
    pub fn find_view(&self, start_time: Option<RelativeTime>) -> Option<ViewContext> {
        self.finder.find_view(start_time)
    }

    /// A detached finder for cross-crate consumers.
    #[must_use]
    pub fn finder(&self) -> ViewContextFinder {
        self.finder.clone()
    }

    /// Detach from the bus. Idempotent.
    pub fn stop(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

/// Start tracking view contexts on the bus.
pub fn start_view_contexts(life_cycle: &LifeCycle) -> ViewContexts {
    let history: SharedHistory = Arc::new(Mutex::new(ValueHistory::new(VIEW_CONTEXT_TIME_OUT_DELAY)));
    let current_entry: Arc<Mutex<Option<Arc<HistoryEntry<ViewContext>>>>> = Arc::new(Mutex::new(None));

    let on_view_created = life_cycle.subscribe(LifecycleEventKind::ViewCreated, {
        let history = Arc::clone(&history);
        let current_entry = Arc::clone(&current_entry);
        move |event| {
            let LifecycleEvent::ViewCreated(view) = event else {
                return;
            };
            let mut current = current_entry.lock();
            if let Some(previous) = current.take() {
                previous.close(view.start_clocks.relative);
            }
            *current = Some(history.lock().add(
                ViewContext {
                    id: view.id.clone(),
                    name: view.name.clone(),
                    service: view.service.clone(),
                    version: view.version.clone(),
                    start_clocks: view.start_clocks,
                },
                view.start_clocks.relative,
            ));
        }
    });

    let on_session_renewed = life_cycle.subscribe(LifecycleEventKind::SessionRenewed, {
        let history = Arc::clone(&history);
        let current_entry = Arc::clone(&current_entry);
        move |_| {
            *current_entry.lock() = None;
            history.lock().reset();
        }
    });

    ViewContexts {
        finder: ViewContextFinder { history },
        subscriptions: vec![on_view_created, on_session_renewed],
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
