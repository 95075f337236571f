//! Performance entry vocabulary.
//!
//! The host adapter batches the runtime's performance observations and
//! publishes them on the life-cycle bus as
//! [`LifecycleEvent::PerformanceEntriesCollected`](crate::lifecycle::LifecycleEvent).
//! Layout-shift sources carry a pre-resolved CSS selector instead of a live
//! DOM node; `is_connected` reflects whether the element was still attached
//! when the batch was captured.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::time::RelativeTime;

/// One observation delivered by the runtime's performance buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry_type", rename_all = "kebab-case")]
pub enum PerformanceEntry {
    /// A fetched sub-resource (script, stylesheet, XHR target, ...).
    Resource(ResourceEntry),
    /// The document navigation itself.
    Navigation(NavigationEntry),
    /// An unexpected movement of page content.
    LayoutShift(LayoutShiftEntry),
}

/// Timing of a fetched sub-resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Resource URL.
    pub url: String,
    /// Fetch start on the relative axis.
    pub start_time: RelativeTime,
    /// Fetch duration.
    pub duration: Duration,
}

/// Timing of the document navigation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavigationEntry {
    /// End of the document `load` event, relative to the time origin.
    pub load_event_end: Duration,
}

/// One layout shift observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutShiftEntry {
    /// Shift score contributed by this entry.
    pub value: f64,
    /// Whether the shift happened within 500ms of a user input.
    pub had_recent_input: bool,
    /// When the shift occurred, on the relative axis.
    pub start_time: RelativeTime,
    /// Elements that moved, largest impact first.
    #[serde(default)]
    pub sources: Vec<LayoutShiftSource>,
}

/// One element that moved during a layout shift.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutShiftSource {
    /// CSS selector of the shifted element, resolved by the host adapter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Whether the element was still attached to the document.
    pub is_connected: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
