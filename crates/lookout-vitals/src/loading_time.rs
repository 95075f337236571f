//! View loading time.
//!
//! The loading time of a view is the latest of its candidate signals:
//!
//! - the page-activity quiescence end, elapsed from the view start;
//! - for initial loads, the navigation `load` event end (fed by navigation
//!   performance entries, or injected through
//!   [`LoadingTimeTracker::set_load_event`]).
//!
//! The callback fires once, with the maximum candidate, when every awaited
//! candidate has arrived. A route-change view only waits for activity; a
//! view with no activity and no load event never reports a loading time.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use lookout_core::lifecycle::{LifeCycle, LifecycleEvent, LifecycleEventKind};
use lookout_core::observable::Subscription;
use lookout_core::performance::PerformanceEntry;
use lookout_core::time::{Clock, Clocks};

use crate::browser::BrowserSignals;
use crate::configuration::VitalsConfiguration;
use crate::page_activity::{PageActivityEndEvent, PageActivityWaitHandle, wait_page_activity_end};

/// How a view came into being.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewLoadingType {
    /// The first view of the page, tied to the document load.
    InitialLoad,
    /// A view started by an in-page navigation.
    RouteChange,
}

struct LoadingState {
    waiting_for_activity: bool,
    waiting_for_load_event: bool,
    candidates: Vec<Duration>,
    callback: Option<Box<dyn FnOnce(Duration) + Send>>,
}

impl LoadingState {
    fn invoke_if_all_candidates_received(&mut self) {
        if self.waiting_for_activity || self.waiting_for_load_event {
            return;
        }
        if let Some(loading_time) = self.candidates.iter().copied().max() {
            if let Some(callback) = self.callback.take() {
                callback(loading_time);
            }
        }
    }
}

/// Tracks the loading time of one view.
pub struct LoadingTimeTracker {
    state: Arc<Mutex<LoadingState>>,
    wait: PageActivityWaitHandle,
    subscription: Option<Subscription>,
}

impl LoadingTimeTracker {
    /// Inject the document load event end. Ignored for route-change views
    /// and after the first injection.
    pub fn set_load_event(&self, load_event_end: Duration) {
        set_load_event(&self.state, load_event_end);
    }

    /// Stop tracking. Idempotent; the callback will not fire afterwards.
    pub fn stop(&mut self) {
        self.wait.stop();
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.state.lock().callback = None;
    }
}

impl std::fmt::Debug for LoadingTimeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingTimeTracker").finish_non_exhaustive()
    }
}

fn set_load_event(state: &Arc<Mutex<LoadingState>>, load_event_end: Duration) {
    let mut state = state.lock();
    if !state.waiting_for_load_event {
        return;
    }
    state.waiting_for_load_event = false;
    state.candidates.push(load_event_end);
    state.invoke_if_all_candidates_received();
}

/// Start tracking the loading time of a view started at `view_start`.
///
/// Must be called within a tokio runtime (the quiescence wait spawns timer
/// tasks).
pub fn track_loading_time(
    clock: Clock,
    life_cycle: &Arc<LifeCycle>,
    signals: &BrowserSignals,
    configuration: &VitalsConfiguration,
    loading_type: ViewLoadingType,
    view_start: Clocks,
    callback: impl FnOnce(Duration) + Send + 'static,
) -> LoadingTimeTracker {
    let state = Arc::new(Mutex::new(LoadingState {
        waiting_for_activity: true,
        waiting_for_load_event: loading_type == ViewLoadingType::InitialLoad,
        candidates: Vec::new(),
        callback: Some(Box::new(callback)),
    }));

    let wait = wait_page_activity_end(
        clock,
        Arc::clone(life_cycle),
        signals,
        configuration,
        {
            let state = Arc::clone(&state);
            move |event| {
                let mut state = state.lock();
                if !state.waiting_for_activity {
                    return;
                }
                state.waiting_for_activity = false;
                if let PageActivityEndEvent::Active { end } = event {
                    state.candidates.push(end.duration_since(view_start.timestamp));
                }
                state.invoke_if_all_candidates_received();
            }
        },
        None,
    );

    // navigation timing feeds the load event for the initial view
    let subscription = life_cycle.subscribe(LifecycleEventKind::PerformanceEntriesCollected, {
        let state = Arc::clone(&state);
        move |event| {
            let LifecycleEvent::PerformanceEntriesCollected(entries) = event else {
                return;
            };
            for entry in entries {
                if let PerformanceEntry::Navigation(navigation) = entry {
                    set_load_event(&state, navigation.load_event_end);
                }
            }
        }
    });

    LoadingTimeTracker {
        state,
        wait,
        subscription: Some(subscription),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
