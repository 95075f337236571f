//! # lookout-vitals
//!
//! Page-level trackers for the Lookout telemetry SDK:
//!
//! - **View contexts**: which view was active at a point in time
//! - **Feature flag contexts**: evaluations scoped to a view's lifetime
//! - **User context**: time-indexed ambient user snapshots
//! - **Page activity**: busy/idle stream and the quiescence wait
//! - **Loading time**: when a view settled after it started
//! - **Cumulative layout shift**: session-windowed CLS with a monotonic
//!   maximum
//!
//! The trackers subscribe to the life-cycle bus from `lookout-core` and are
//! fed by the embedder's adapters through [`browser::BrowserSignals`] and
//! performance entry batches.

#![deny(unsafe_code)]

pub mod browser;
pub mod configuration;
pub mod feature_flags;
pub mod internal_context;
pub mod layout_shift;
pub mod loading_time;
pub mod page_activity;
pub mod user_context;
pub mod view_contexts;

pub use browser::BrowserSignals;
pub use configuration::{
    VitalsConfiguration, VitalsInitConfiguration, validate_and_build_vitals_configuration,
};
pub use feature_flags::{FeatureFlagContexts, FeatureFlagFinder, start_feature_flag_contexts};
pub use internal_context::InternalContextResolver;
pub use layout_shift::{CumulativeLayoutShift, LayoutShiftTracker, track_cumulative_layout_shift};
pub use loading_time::{LoadingTimeTracker, ViewLoadingType, track_loading_time};
pub use page_activity::{
    PAGE_ACTIVITY_END_DELAY, PAGE_ACTIVITY_VALIDATION_DELAY, PageActivityEndEvent,
    PageActivityEvent, PageActivityWaitHandle, create_page_activity_observable,
    do_wait_page_activity_end, wait_page_activity_end,
};
pub use user_context::{UserContexts, start_user_contexts};
pub use view_contexts::{ViewContext, ViewContextFinder, ViewContexts, start_view_contexts};

use std::sync::Arc;

use lookout_core::context::InternalContextProvider;
use lookout_core::lifecycle::LifeCycle;
use lookout_core::time::Clock;

/// The context tracker bundle.
pub struct Vitals {
    /// View context tracker.
    pub view_contexts: ViewContexts,
    /// Feature flag context tracker.
    pub feature_flags: FeatureFlagContexts,
    /// Ambient user tracker.
    pub user_contexts: UserContexts,
}

impl Vitals {
    /// The internal-context provider consumed by event assembly.
    #[must_use]
    pub fn internal_context_provider(&self) -> InternalContextProvider {
        InternalContextResolver::new(self.view_contexts.finder(), self.feature_flags.finder())
            .provider()
    }

    /// Detach every tracker from the bus. Idempotent.
    pub fn stop(&mut self) {
        self.view_contexts.stop();
        self.feature_flags.stop();
        self.user_contexts.stop();
    }
}

impl std::fmt::Debug for Vitals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vitals").finish_non_exhaustive()
    }
}

/// Start the context trackers on the bus.
pub fn start_vitals(clock: Clock, life_cycle: &Arc<LifeCycle>) -> Vitals {
    Vitals {
        view_contexts: start_view_contexts(life_cycle),
        feature_flags: start_feature_flag_contexts(life_cycle),
        user_contexts: start_user_contexts(clock, life_cycle),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
