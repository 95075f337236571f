//! Console instrumentation.
//!
//! The SDK owns one observable per console api, held in a per-instance
//! [`ConsoleRegistry`] (never a process-wide singleton) and reset on
//! teardown. The [`Console`] handle is the instrumented entry point: every
//! record is mirrored to `tracing` at the matching level, then republished
//! on the api's observable for collectors.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::observable::{Observable, merge_observables};

/// The instrumented console apis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleApi {
    /// `console.debug`
    Debug,
    /// `console.log`
    Log,
    /// `console.info`
    Info,
    /// `console.warn`
    Warn,
    /// `console.error`
    Error,
}

impl ConsoleApi {
    /// Every api.
    pub const ALL: [Self; 5] = [Self::Debug, Self::Log, Self::Info, Self::Warn, Self::Error];

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Log => "log",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ConsoleApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured console record.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsoleRecord {
    /// The api the record went through.
    pub api: ConsoleApi,
    /// Formatted message.
    pub message: String,
    /// Rendered error chain, for error records with a source.
    pub stack: Option<String>,
    /// Grouping fingerprint, when the host provides one.
    pub fingerprint: Option<String>,
}

/// Per-instance registry of console observables, keyed by api.
#[derive(Debug, Default)]
pub struct ConsoleRegistry {
    channels: Mutex<HashMap<ConsoleApi, Observable<ConsoleRecord>>>,
}

impl ConsoleRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The observable of one api, created lazily.
    #[must_use]
    pub fn channel(&self, api: ConsoleApi) -> Observable<ConsoleRecord> {
        self.channels.lock().entry(api).or_default().clone()
    }

    /// One stream over the records of the given apis.
    #[must_use]
    pub fn observable(&self, apis: &[ConsoleApi]) -> Observable<ConsoleRecord> {
        merge_observables(apis.iter().map(|api| self.channel(*api)).collect())
    }

    /// Drop every channel. Existing subscriptions keep their channel alive
    /// but new records no longer reach it.
    pub fn reset(&self) {
        self.channels.lock().clear();
    }
}

/// The instrumented console entry point.
#[derive(Clone, Debug)]
pub struct Console {
    registry: Arc<ConsoleRegistry>,
}

impl Console {
    /// Console publishing into `registry`.
    #[must_use]
    pub fn new(registry: Arc<ConsoleRegistry>) -> Self {
        Self { registry }
    }

    /// `console.debug`
    pub fn debug(&self, message: impl Into<String>) {
        self.report(record(ConsoleApi::Debug, message));
    }

    /// `console.log`
    pub fn log(&self, message: impl Into<String>) {
        self.report(record(ConsoleApi::Log, message));
    }

    /// `console.info`
    pub fn info(&self, message: impl Into<String>) {
        self.report(record(ConsoleApi::Info, message));
    }

    /// `console.warn`
    pub fn warn(&self, message: impl Into<String>) {
        self.report(record(ConsoleApi::Warn, message));
    }

    /// `console.error`, rendering the source error chain into the stack.
    pub fn error(&self, message: impl Into<String>, source: Option<&(dyn std::error::Error + 'static)>) {
        let mut record = record(ConsoleApi::Error, message);
        record.stack = source.map(render_error_chain);
        self.report(record);
    }

    /// Publish a fully built record.
    pub fn report(&self, record: ConsoleRecord) {
        forward_to_tracing(&record);
        self.registry.channel(record.api).notify(record);
    }
}

fn record(api: ConsoleApi, message: impl Into<String>) -> ConsoleRecord {
    ConsoleRecord {
        api,
        message: message.into(),
        stack: None,
        fingerprint: None,
    }
}

fn forward_to_tracing(record: &ConsoleRecord) {
    match record.api {
        ConsoleApi::Debug => tracing::debug!(target: "lookout::console", "{}", record.message),
        ConsoleApi::Log | ConsoleApi::Info => {
            tracing::info!(target: "lookout::console", "{}", record.message);
        }
        ConsoleApi::Warn => tracing::warn!(target: "lookout::console", "{}", record.message),
        ConsoleApi::Error => tracing::error!(target: "lookout::console", "{}", record.message),
    }
}

/// Render an error and its `source` chain into one stack-like string.
#[must_use]
pub fn render_error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str("\ncaused by: ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sink(records: &Arc<Mutex<Vec<ConsoleRecord>>>) -> impl Fn(&ConsoleRecord) + Send + Sync + 'static {
        let records = Arc::clone(records);
        move |record: &ConsoleRecord| records.lock().push(record.clone())
    }

    #[test]
    fn records_reach_the_api_channel() {
        let registry = Arc::new(ConsoleRegistry::new());
        let console = Console::new(Arc::clone(&registry));
        let records = Arc::new(Mutex::new(Vec::new()));
        let _ = registry.channel(ConsoleApi::Warn).subscribe(sink(&records));

        console.warn("careful");
        console.info("not forwarded to the warn channel");

        let records = records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].api, ConsoleApi::Warn);
        assert_eq!(records[0].message, "careful");
    }

    #[test]
    fn merged_observable_covers_selected_apis() {
        let registry = Arc::new(ConsoleRegistry::new());
        let console = Console::new(Arc::clone(&registry));
        let records = Arc::new(Mutex::new(Vec::new()));
        let _ = registry
            .observable(&[ConsoleApi::Warn, ConsoleApi::Error])
            .subscribe(sink(&records));

        console.warn("one");
        console.error("two", None);
        console.debug("ignored");

        let apis: Vec<ConsoleApi> = records.lock().iter().map(|record| record.api).collect();
        assert_eq!(apis, vec![ConsoleApi::Warn, ConsoleApi::Error]);
    }

    #[test]
    fn error_records_render_the_cause_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("outer failure")]
        struct Outer(#[source] Inner);
        #[derive(Debug, thiserror::Error)]
        #[error("inner failure")]
        struct Inner;

        let registry = Arc::new(ConsoleRegistry::new());
        let console = Console::new(Arc::clone(&registry));
        let records = Arc::new(Mutex::new(Vec::new()));
        let _ = registry.channel(ConsoleApi::Error).subscribe(sink(&records));

        console.error("request failed", Some(&Outer(Inner)));

        let records = records.lock();
        assert_eq!(
            records[0].stack.as_deref(),
            Some("outer failure\ncaused by: inner failure")
        );
    }

    #[test]
    fn reset_detaches_future_records() {
        let registry = Arc::new(ConsoleRegistry::new());
        let console = Console::new(Arc::clone(&registry));
        let records = Arc::new(Mutex::new(Vec::new()));
        let _ = registry.channel(ConsoleApi::Log).subscribe(sink(&records));

        console.log("before");
        registry.reset();
        console.log("after");

        let records = records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "before");
    }
}
