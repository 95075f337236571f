//! # lookout-core
//!
//! Foundation of the Lookout page-telemetry SDK.
//!
//! This crate provides the shared vocabulary the feature crates build on:
//!
//! - **Observable**: synchronous publish/subscribe with setup/teardown hooks
//! - **Life-Cycle bus**: one observable per event kind, decoupling
//!   collectors from the assembler
//! - **Value History**: time-indexed context snapshots with lazy eviction
//! - **Context**: JSON object contexts and precedence-correct deep merge
//! - **Rate limiter**: per-kind, one-minute windows measured at arrival
//! - **Console**: per-instance registry of instrumented console observables
//! - **Contracts**: session lookup, diagnostic reporting, monitored
//!   execution of user callbacks

#![deny(unsafe_code)]

pub mod console;
pub mod context;
pub mod errors;
pub mod events;
pub mod history;
pub mod ids;
pub mod lifecycle;
pub mod limiter;
pub mod matcher;
pub mod monitor;
pub mod observable;
pub mod performance;
pub mod session;
pub mod telemetry;
pub mod time;
pub mod user;

pub use console::{Console, ConsoleApi, ConsoleRecord, ConsoleRegistry};
pub use context::{
    CommonContext, CommonContextProvider, Context, ContextManager, ContextValue,
    InternalContextProvider, PageReference, combine, deep_merge,
};
pub use errors::ConfigurationError;
pub use events::{
    LogErrorDetails, LogsEvent, RawLogCollected, RawLogEvent, RequestCompleteEvent,
    RequestStartEvent, StatusType, ViewCreatedEvent, ViewEndedEvent,
};
pub use history::{HistoryEntry, ValueHistory};
pub use ids::{SessionId, ViewId};
pub use lifecycle::{LifeCycle, LifecycleEvent, LifecycleEventKind};
pub use limiter::EventRateLimiter;
pub use matcher::{MatchList, MatchOption};
pub use monitor::call_monitored;
pub use observable::{Observable, Subscription, Teardown, merge_observables};
pub use performance::{
    LayoutShiftEntry, LayoutShiftSource, NavigationEntry, PerformanceEntry, ResourceEntry,
};
pub use session::{SESSION_TIME_OUT_DELAY, SessionLookup, SessionLookupOptions, TrackedSession};
pub use telemetry::{DiagnosticReporter, ErrorSource, RawDiagnostic};
pub use time::{Clock, Clocks, ONE_MINUTE, ONE_SECOND, RelativeTime, TimeStamp};
pub use user::User;
