//! Host runtime signal adapters.
//!
//! The trackers never touch the host runtime directly: the embedder owns
//! the DOM-facing adapters and feeds their observations into these
//! observables. A capability the runtime does not support is represented by
//! a signal that simply never fires, so every tracker degrades to a no-op
//! without special-casing.

use lookout_core::observable::Observable;

/// The injected host-page signals.
#[derive(Clone, Debug, Default)]
pub struct BrowserSignals {
    /// Fires on any DOM mutation batch.
    pub dom_mutation: Observable<()>,
    /// Fires when the page opens a new window.
    pub window_open: Observable<()>,
}

impl BrowserSignals {
    /// Signals with no producer attached yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
