//! Cumulative layout shift (CLS).
//!
//! Layout shifts are grouped into session windows: a window accumulates
//! entries while consecutive gaps stay under one second and the window
//! spans less than five seconds; otherwise a new window starts. The CLS
//! value is the maximum window sum seen so far, so it is non-decreasing;
//! the callback fires only when a new maximum is reached, carrying the
//! selector of the shift that produced it while its element is attached.

use std::time::Duration;

use parking_lot::Mutex;

use lookout_core::lifecycle::{LifeCycle, LifecycleEvent, LifecycleEventKind};
use lookout_core::observable::Subscription;
use lookout_core::performance::{LayoutShiftEntry, PerformanceEntry};
use lookout_core::time::RelativeTime;

use crate::configuration::VitalsConfiguration;

/// A session window never spans more than five seconds.
pub const MAX_WINDOW_DURATION: Duration = Duration::from_secs(5);
/// A gap of one second or more starts a new session window.
pub const MAX_UPDATE_GAP: Duration = Duration::from_secs(1);

/// The reported CLS value.
#[derive(Clone, Debug, PartialEq)]
pub struct CumulativeLayoutShift {
    /// Maximum session-window sum so far, rounded to four decimals.
    pub value: f64,
    /// Selector of the shift that produced the maximum, when its element
    /// was still attached.
    pub target_selector: Option<String>,
}

#[derive(Debug, Default)]
struct SlidingWindow {
    cumulated_value: f64,
    start_time: Option<RelativeTime>,
    end_time: RelativeTime,
    max_value: f64,
}

struct WindowUpdate {
    cumulated_value: f64,
    is_max_value: bool,
}

impl SlidingWindow {
    fn update(&mut self, entry: &LayoutShiftEntry) -> WindowUpdate {
        let should_create_new_window = match self.start_time {
            None => true,
            Some(start_time) => {
                entry.start_time.duration_since(self.end_time) >= MAX_UPDATE_GAP
                    || entry.start_time.duration_since(start_time) >= MAX_WINDOW_DURATION
            }
        };

        let mut is_max_value;
        if should_create_new_window {
            self.start_time = Some(entry.start_time);
            self.end_time = entry.start_time;
            self.cumulated_value = entry.value;
            self.max_value = entry.value;
            is_max_value = true;
        } else {
            self.cumulated_value += entry.value;
            self.end_time = entry.start_time;
            is_max_value = false;
        }

        if entry.value > self.max_value {
            self.max_value = entry.value;
            is_max_value = true;
        }

        WindowUpdate {
            cumulated_value: self.cumulated_value,
            is_max_value,
        }
    }
}

struct ClsState {
    window: SlidingWindow,
    max_cls_value: f64,
    max_cls_target_selector: Option<String>,
}

/// Tracks the cumulative layout shift of the page.
#[derive(Debug)]
pub struct LayoutShiftTracker {
    subscription: Option<Subscription>,
}

impl LayoutShiftTracker {
    /// Detach from the bus. Idempotent.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

/// Start tracking CLS.
///
/// Reports an initial `{value: 0}` exactly once; when the runtime cannot
/// observe layout shifts the tracker stays a no-op after that.
pub fn track_cumulative_layout_shift(
    configuration: &VitalsConfiguration,
    life_cycle: &LifeCycle,
    callback: impl Fn(CumulativeLayoutShift) + Send + Sync + 'static,
) -> LayoutShiftTracker {
    // with no layout shift, the value must still be reported as 0
    callback(CumulativeLayoutShift {
        value: 0.0,
        target_selector: None,
    });
    if !configuration.layout_shift_supported {
        return LayoutShiftTracker { subscription: None };
    }

    let state = Mutex::new(ClsState {
        window: SlidingWindow::default(),
        max_cls_value: 0.0,
        max_cls_target_selector: None,
    });

    let subscription = life_cycle.subscribe(LifecycleEventKind::PerformanceEntriesCollected, {
        move |event| {
            let LifecycleEvent::PerformanceEntriesCollected(entries) = event else {
                return;
            };
            for entry in entries {
                let PerformanceEntry::LayoutShift(shift) = entry else {
                    continue;
                };
                if shift.had_recent_input {
                    continue;
                }
                let report = {
                    let mut state = state.lock();
                    let update = state.window.update(shift);
                    if update.is_max_value {
                        state.max_cls_target_selector = target_selector(shift);
                    }
                    if update.cumulated_value > state.max_cls_value {
                        state.max_cls_value = update.cumulated_value;
                        Some(CumulativeLayoutShift {
                            value: round_4(update.cumulated_value),
                            target_selector: state.max_cls_target_selector.clone(),
                        })
                    } else {
                        None
                    }
                };
                if let Some(report) = report {
                    callback(report);
                }
            }
        }
    });

    LayoutShiftTracker {
        subscription: Some(subscription),
    }
}

/// Selector of the first element source, kept only while attached.
fn target_selector(entry: &LayoutShiftEntry) -> Option<String> {
    let source = entry.sources.iter().find(|source| source.selector.is_some())?;
    if source.is_connected {
        source.selector.clone()
    } else {
        None
    }
}

fn round_4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use lookout_core::performance::LayoutShiftSource;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn shift(start_millis: u64, value: f64) -> PerformanceEntry {
        PerformanceEntry::LayoutShift(LayoutShiftEntry {
            value,
            had_recent_input: false,
            start_time: RelativeTime::from_millis(start_millis),
            sources: Vec::new(),
        })
    }

    struct Setup {
        life_cycle: LifeCycle,
        reported: Arc<Mutex<Vec<CumulativeLayoutShift>>>,
        tracker: LayoutShiftTracker,
    }

    fn tracking(supported: bool) -> Setup {
        let life_cycle = LifeCycle::new();
        let reported = Arc::new(Mutex::new(Vec::new()));
        let tracker = track_cumulative_layout_shift(
            &VitalsConfiguration {
                layout_shift_supported: supported,
                ..VitalsConfiguration::default()
            },
            &life_cycle,
            {
                let reported = Arc::clone(&reported);
                move |cls| reported.lock().push(cls)
            },
        );
        Setup {
            life_cycle,
            reported,
            tracker,
        }
    }

    fn values(setup: &Setup) -> Vec<f64> {
        setup.reported.lock().iter().map(|cls| cls.value).collect()
    }

    #[test]
    fn reports_zero_initially() {
        let setup = tracking(true);
        assert_eq!(values(&setup), vec![0.0]);
    }

    #[test]
    fn unsupported_runtime_reports_zero_once_then_stays_silent() {
        let setup = tracking(false);
        setup
            .life_cycle
            .notify(LifecycleEvent::PerformanceEntriesCollected(vec![shift(0, 0.5)]));
        assert_eq!(values(&setup), vec![0.0]);
    }

    #[test]
    fn entries_within_a_second_accumulate_into_one_window() {
        let setup = tracking(true);
        setup
            .life_cycle
            .notify(LifecycleEvent::PerformanceEntriesCollected(vec![
                shift(0, 0.1),
                shift(500, 0.2),
            ]));
        assert_eq!(values(&setup), vec![0.0, 0.1, 0.3]);
    }

    #[test]
    fn a_gap_of_more_than_a_second_starts_a_new_window() {
        let setup = tracking(true);
        setup
            .life_cycle
            .notify(LifecycleEvent::PerformanceEntriesCollected(vec![
                shift(0, 0.1),
                shift(1_500, 0.2),
            ]));
        // the second window (0.2) beats the first (0.1)
        assert_eq!(values(&setup), vec![0.0, 0.1, 0.2]);
    }

    #[test]
    fn a_window_never_spans_more_than_five_seconds() {
        let setup = tracking(true);
        setup
            .life_cycle
            .notify(LifecycleEvent::PerformanceEntriesCollected(vec![
                shift(0, 0.1),
                shift(999, 0.1),
                shift(1_998, 0.1),
                shift(2_997, 0.1),
                shift(3_996, 0.1),
                shift(4_995, 0.1),
                // 5_994ms after the window start: a new window begins
                shift(5_994, 0.2),
            ]));
        let reported = values(&setup);
        // the running maximum never decreases even though the new window
        // restarts at 0.2
        assert_eq!(reported.last().copied(), Some(0.6));
        assert!(reported.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn the_reported_value_is_the_maximum_across_windows() {
        let setup = tracking(true);
        setup
            .life_cycle
            .notify(LifecycleEvent::PerformanceEntriesCollected(vec![
                shift(0, 0.3),
                // new window with a smaller sum: no report
                shift(2_000, 0.1),
                // growing beyond the first window's sum: reported again
                shift(2_100, 0.3),
            ]));
        assert_eq!(values(&setup), vec![0.0, 0.3, 0.4]);
    }

    #[test]
    fn entries_with_recent_input_are_ignored() {
        let setup = tracking(true);
        setup
            .life_cycle
            .notify(LifecycleEvent::PerformanceEntriesCollected(vec![
                PerformanceEntry::LayoutShift(LayoutShiftEntry {
                    value: 0.9,
                    had_recent_input: true,
                    start_time: RelativeTime::ZERO,
                    sources: Vec::new(),
                }),
            ]));
        assert_eq!(values(&setup), vec![0.0]);
    }

    #[test]
    fn values_are_rounded_to_four_decimals() {
        let setup = tracking(true);
        setup
            .life_cycle
            .notify(LifecycleEvent::PerformanceEntriesCollected(vec![shift(
                0, 0.123_456,
            )]));
        assert_eq!(values(&setup), vec![0.0, 0.1235]);
    }

    #[test]
    fn the_selector_of_the_max_contributor_is_reported_while_connected() {
        let setup = tracking(true);
        setup
            .life_cycle
            .notify(LifecycleEvent::PerformanceEntriesCollected(vec![
                PerformanceEntry::LayoutShift(LayoutShiftEntry {
                    value: 0.2,
                    had_recent_input: false,
                    start_time: RelativeTime::ZERO,
                    sources: vec![LayoutShiftSource {
                        selector: Some("#hero".to_owned()),
                        is_connected: true,
                    }],
                }),
            ]));
        let reported = setup.reported.lock();
        assert_eq!(reported.last().unwrap().target_selector.as_deref(), Some("#hero"));
    }

    #[test]
    fn a_detached_element_yields_no_selector() {
        let setup = tracking(true);
        setup
            .life_cycle
            .notify(LifecycleEvent::PerformanceEntriesCollected(vec![
                PerformanceEntry::LayoutShift(LayoutShiftEntry {
                    value: 0.2,
                    had_recent_input: false,
                    start_time: RelativeTime::ZERO,
                    sources: vec![LayoutShiftSource {
                        selector: Some("#gone".to_owned()),
                        is_connected: false,
                    }],
                }),
            ]));
        let reported = setup.reported.lock();
        assert_eq!(reported.last().unwrap().target_selector, None);
    }

    #[test]
    fn stop_detaches_from_the_bus() {
        let mut setup = tracking(true);
        setup.tracker.stop();
        setup
            .life_cycle
            .notify(LifecycleEvent::PerformanceEntriesCollected(vec![shift(0, 0.5)]));
        assert_eq!(values(&setup), vec![0.0]);
        setup.tracker.stop();
    }
}
