//! Payload vocabulary of the life-cycle bus.
//!
//! The bus enum in [`crate::lifecycle`] is closed over these types:
//! collectors publish raw observations, the trackers publish view/session
//! boundaries, and the assembler publishes finalized events.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::{CommonContext, Context};
use crate::ids::ViewId;
use crate::telemetry::ErrorSource;
use crate::time::{Clocks, TimeStamp};

/// Severity of a log observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusType {
    /// Diagnostic detail.
    Debug,
    /// Expected outcomes.
    Info,
    /// Non-fatal issues.
    Warn,
    /// Errors.
    Error,
}

impl StatusType {
    /// Every status, severity ascending.
    pub const ALL: [Self; 4] = [Self::Debug, Self::Info, Self::Warn, Self::Error];

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for StatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error details attached to a raw log observation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogErrorDetails {
    /// Error kind or type name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Rendered stack or cause chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Grouping fingerprint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// An un-enriched log observation, immutable once published.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawLogEvent {
    /// When the observation was made.
    pub date: TimeStamp,
    /// Log message.
    pub message: String,
    /// Severity.
    pub status: StatusType,
    /// Collector that produced the observation.
    pub origin: ErrorSource,
    /// Error details, when the observation is an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<LogErrorDetails>,
}

impl RawLogEvent {
    /// Render the raw fields as a context layer for assembly.
    #[must_use]
    pub fn to_context(&self) -> Context {
        let mut fields = Context::new();
        let _ = fields.insert("date".to_owned(), serde_json::json!(self.date));
        let _ = fields.insert("message".to_owned(), serde_json::Value::String(self.message.clone()));
        let _ = fields.insert(
            "status".to_owned(),
            serde_json::Value::String(self.status.as_str().to_owned()),
        );
        let _ = fields.insert(
            "origin".to_owned(),
            serde_json::Value::String(self.origin.as_str().to_owned()),
        );
        if let Some(error) = &self.error {
            let mut details = Context::new();
            if let Some(kind) = &error.kind {
                let _ = details.insert("kind".to_owned(), serde_json::Value::String(kind.clone()));
            }
            if let Some(stack) = &error.stack {
                let _ = details.insert("stack".to_owned(), serde_json::Value::String(stack.clone()));
            }
            if let Some(fingerprint) = &error.fingerprint {
                let _ = details.insert(
                    "fingerprint".to_owned(),
                    serde_json::Value::String(fingerprint.clone()),
                );
            }
            let _ = fields.insert("error".to_owned(), serde_json::Value::Object(details));
        }
        fields
    }
}

/// A raw log observation with its per-call context, as published on the bus.
#[derive(Clone, Debug)]
pub struct RawLogCollected {
    /// The observation itself.
    pub raw: RawLogEvent,
    /// Per-call context, highest merge precedence.
    pub message_context: Option<Context>,
    /// Common context captured when the observation was made; replaces the
    /// ambient common context wholesale.
    pub saved_common_context: Option<CommonContext>,
}

/// A finalized, context-enriched event ready for hand-off.
pub type LogsEvent = Context;

/// A new view started tracking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewCreatedEvent {
    /// View identifier.
    pub id: ViewId,
    /// View name, when one was computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Service the view belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Application version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// When the view started.
    pub start_clocks: Clocks,
}

/// The current view stopped tracking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewEndedEvent {
    /// When the view ended.
    pub end_clocks: Clocks,
}

/// A network request left the application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestStartEvent {
    /// Monotonic index pairing start and completion.
    pub request_index: u64,
    /// Request URL.
    pub url: String,
}

/// A network request completed (successfully or not).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestCompleteEvent {
    /// Monotonic index pairing start and completion.
    pub request_index: u64,
    /// Request URL.
    pub url: String,
    /// Response status, when one was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Request duration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
