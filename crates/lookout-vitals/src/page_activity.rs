//! Page activity detection and quiescence wait.
//!
//! [`create_page_activity_observable`] folds four signal sources into one
//! busy/idle stream: DOM mutations, non-excluded resource entries, paired
//! network request start/completions, and window-open calls. The stream is
//! busy exactly while a non-excluded request is outstanding.
//!
//! [`do_wait_page_activity_end`] is the quiescence state machine layered on
//! top: it waits for a first activity within the validation delay, then for
//! a quiet period after the last activity, suspending the countdown while
//! the page is busy, with an optional hard deadline. The terminal callback
//! fires exactly once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::trace;

use lookout_core::lifecycle::{LifeCycle, LifecycleEvent, LifecycleEventKind};
use lookout_core::monitor::call_monitored;
use lookout_core::observable::{Observable, Subscription, Teardown};
use lookout_core::performance::PerformanceEntry;
use lookout_core::time::{Clock, TimeStamp};

use crate::browser::BrowserSignals;
use crate::configuration::VitalsConfiguration;

/// Time allowed for a first activity to show up after the wait starts.
pub const PAGE_ACTIVITY_VALIDATION_DELAY: Duration = Duration::from_millis(100);
/// Quiet time after the last activity before the page counts as settled.
pub const PAGE_ACTIVITY_END_DELAY: Duration = Duration::from_millis(100);

/// One observation on the activity stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageActivityEvent {
    /// Whether a blocking request is outstanding.
    pub is_busy: bool,
}

/// Terminal outcome of a quiescence wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageActivityEndEvent {
    /// No activity showed up within the validation delay.
    NoActivity,
    /// The page settled (or the wait hit its hard deadline) at `end`.
    Active {
        /// When the last counted activity happened.
        end: TimeStamp,
    },
}

/// Merge the page's signal sources into one activity stream.
///
/// The sources are only subscribed while the returned observable itself has
/// subscribers. Requests to excluded URLs neither emit activity nor affect
/// the pending count, and a completion whose start was never observed is
/// ignored.
pub fn create_page_activity_observable(
    life_cycle: Arc<LifeCycle>,
    signals: &BrowserSignals,
    configuration: &VitalsConfiguration,
) -> Observable<PageActivityEvent> {
    let excluded = configuration.excluded_activity_urls.clone();
    let dom_mutation = signals.dom_mutation.clone();
    let window_open = signals.window_open.clone();

    Observable::with_setup(move |observable| {
        let pending_requests: Arc<Mutex<HashMap<u64, String>>> = Arc::new(Mutex::new(HashMap::new()));
        let notify_activity = {
            let observable = observable.clone();
            let pending_requests = Arc::clone(&pending_requests);
            move || {
                observable.notify(PageActivityEvent {
                    is_busy: !pending_requests.lock().is_empty(),
                });
            }
        };

        let mut subscriptions = Vec::new();

        subscriptions.push(dom_mutation.subscribe({
            let notify_activity = notify_activity.clone();
            move |_: &()| notify_activity()
        }));

        subscriptions.push(window_open.subscribe({
            let notify_activity = notify_activity.clone();
            move |_: &()| notify_activity()
        }));

        subscriptions.push(life_cycle.subscribe(LifecycleEventKind::PerformanceEntriesCollected, {
            let notify_activity = notify_activity.clone();
            let excluded = excluded.clone();
            move |event| {
                let LifecycleEvent::PerformanceEntriesCollected(entries) = event else {
                    return;
                };
                let has_activity = entries.iter().any(|entry| match entry {
                    PerformanceEntry::Resource(resource) => !excluded.matches(&resource.url),
                    // a navigation is the page itself loading, not activity
                    PerformanceEntry::Navigation(_) | PerformanceEntry::LayoutShift(_) => false,
                });
                if has_activity {
                    notify_activity();
                }
            }
        }));

        subscriptions.push(life_cycle.subscribe(LifecycleEventKind::RequestStarted, {
            let notify_activity = notify_activity.clone();
            let pending_requests = Arc::clone(&pending_requests);
            let excluded = excluded.clone();
            move |event| {
                let LifecycleEvent::RequestStarted(request) = event else {
                    return;
                };
                if excluded.matches(&request.url) {
                    return;
                }
                let _ = pending_requests
                    .lock()
                    .insert(request.request_index, request.url.clone());
                notify_activity();
            }
        }));

        subscriptions.push(life_cycle.subscribe(LifecycleEventKind::RequestCompleted, {
            let notify_activity = notify_activity.clone();
            let pending_requests = Arc::clone(&pending_requests);
            move |event| {
                let LifecycleEvent::RequestCompleted(request) = event else {
                    return;
                };
                if pending_requests.lock().remove(&request.request_index).is_some() {
                    notify_activity();
                }
            }
        }));

        Teardown::from_subscriptions(subscriptions)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Quiescence wait
// ─────────────────────────────────────────────────────────────────────────────

/// Named states of the quiescence wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WaitPhase {
    /// Waiting for a first activity within the validation delay.
    Validating,
    /// An activity happened; waiting out the end delay.
    Extending,
    /// A blocking request is outstanding; the countdown is suspended.
    Busy,
    /// Terminal; the callback fired (or the wait was stopped).
    Complete,
}

struct WaitInner {
    phase: WaitPhase,
    /// Bumped on every activity; timers only complete if their epoch is
    /// still current, so a timer that lost the race to an activity cannot
    /// fire late.
    epoch: u64,
    callback: Option<Box<dyn FnOnce(PageActivityEndEvent) + Send>>,
    subscription: Option<Subscription>,
    validation_timer: Option<JoinHandle<()>>,
    idle_timer: Option<JoinHandle<()>>,
    max_timer: Option<JoinHandle<()>>,
}

type SharedWait = Arc<Mutex<WaitInner>>;

/// Handle cancelling an in-flight quiescence wait.
pub struct PageActivityWaitHandle {
    state: SharedWait,
}

impl PageActivityWaitHandle {
    /// Cancel the wait: timers are cleared, the subscription released, and
    /// the callback will never fire. Idempotent.
    pub fn stop(&self) {
        let (subscription, timers) = {
            let mut inner = self.state.lock();
            if inner.phase == WaitPhase::Complete {
                return;
            }
            inner.phase = WaitPhase::Complete;
            inner.callback = None;
            (inner.subscription.take(), take_timers(&mut inner))
        };
        abort_timers(timers);
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
    }
}

impl std::fmt::Debug for PageActivityWaitHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageActivityWaitHandle")
            .field("phase", &self.state.lock().phase)
            .finish()
    }
}

/// Run the quiescence state machine over an activity stream.
///
/// Must be called within a tokio runtime: the delays are spawned timer
/// tasks, stored for deterministic cancellation.
pub fn do_wait_page_activity_end(
    clock: Clock,
    activity_observable: &Observable<PageActivityEvent>,
    callback: impl FnOnce(PageActivityEndEvent) + Send + 'static,
    max_duration: Option<Duration>,
) -> PageActivityWaitHandle {
    let state: SharedWait = Arc::new(Mutex::new(WaitInner {
        phase: WaitPhase::Validating,
        epoch: 0,
        callback: Some(Box::new(callback)),
        subscription: None,
        validation_timer: None,
        idle_timer: None,
        max_timer: None,
    }));

    {
        let mut inner = state.lock();
        inner.validation_timer = Some(spawn_completion_timer(
            &state,
            PAGE_ACTIVITY_VALIDATION_DELAY,
            Some(0),
            PageActivityEndEvent::NoActivity,
        ));
        if let Some(max_duration) = max_duration {
            let state = Arc::clone(&state);
            inner.max_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(max_duration).await;
                // the hard deadline wins over ongoing busy or activity
                complete(
                    &state,
                    None,
                    PageActivityEndEvent::Active {
                        end: clock.timestamp_now(),
                    },
                );
            }));
        }
    }

    let subscription = activity_observable.subscribe({
        let state = Arc::clone(&state);
        move |activity: &PageActivityEvent| {
            let mut inner = state.lock();
            if inner.phase == WaitPhase::Complete {
                return;
            }
            inner.epoch += 1;
            if let Some(timer) = inner.validation_timer.take() {
                timer.abort();
            }
            if let Some(timer) = inner.idle_timer.take() {
                timer.abort();
            }
            if activity.is_busy {
                inner.phase = WaitPhase::Busy;
                trace!("page busy, end delay suspended");
            } else {
                inner.phase = WaitPhase::Extending;
                let end = clock.timestamp_now();
                let epoch = inner.epoch;
                inner.idle_timer = Some(spawn_completion_timer(
                    &state,
                    PAGE_ACTIVITY_END_DELAY,
                    Some(epoch),
                    PageActivityEndEvent::Active { end },
                ));
            }
        }
    });
    {
        let mut inner = state.lock();
        if inner.phase == WaitPhase::Complete {
            drop(inner);
            subscription.unsubscribe();
        } else {
            inner.subscription = Some(subscription);
        }
    }

    PageActivityWaitHandle { state }
}

fn spawn_completion_timer(
    state: &SharedWait,
    delay: Duration,
    expected_epoch: Option<u64>,
    event: PageActivityEndEvent,
) -> JoinHandle<()> {
    let state = Arc::clone(state);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        complete(&state, expected_epoch, event);
    })
}

fn complete(state: &SharedWait, expected_epoch: Option<u64>, event: PageActivityEndEvent) {
    let (callback, subscription, timers) = {
        let mut inner = state.lock();
        if inner.phase == WaitPhase::Complete {
            return;
        }
        if let Some(epoch) = expected_epoch {
            if inner.epoch != epoch {
                return;
            }
        }
        inner.phase = WaitPhase::Complete;
        (inner.callback.take(), inner.subscription.take(), take_timers(&mut inner))
    };
    abort_timers(timers);
    if let Some(subscription) = subscription {
        subscription.unsubscribe();
    }
    if let Some(callback) = callback {
        let _ = call_monitored("page_activity_end", move || callback(event));
    }
}

fn take_timers(inner: &mut WaitInner) -> [Option<JoinHandle<()>>; 3] {
    [
        inner.validation_timer.take(),
        inner.idle_timer.take(),
        inner.max_timer.take(),
    ]
}

fn abort_timers(timers: [Option<JoinHandle<()>>; 3]) {
    for timer in timers.into_iter().flatten() {
        timer.abort();
    }
}

/// Wire an activity observable to the quiescence wait in one call.
pub fn wait_page_activity_end(
    clock: Clock,
    life_cycle: Arc<LifeCycle>,
    signals: &BrowserSignals,
    configuration: &VitalsConfiguration,
    callback: impl FnOnce(PageActivityEndEvent) + Send + 'static,
    max_duration: Option<Duration>,
) -> PageActivityWaitHandle {
    let activity_observable = create_page_activity_observable(life_cycle, signals, configuration);
    do_wait_page_activity_end(clock, &activity_observable, callback, max_duration)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
