//! Diagnostic vocabulary.
//!
//! Policy outcomes inside the SDK (rate limits, contained callback
//! failures) are surfaced to the embedder through a [`DiagnosticReporter`]
//! callback carrying a [`RawDiagnostic`], attributed to the
//! [`ErrorSource::Agent`] source.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::time::Clocks;

/// Where an error or diagnostic originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSource {
    /// The SDK itself.
    Agent,
    /// An instrumented console call.
    Console,
    /// The logger API.
    Logger,
    /// A network failure observation.
    Network,
    /// An uncaught source error.
    Source,
    /// A customer-reported error.
    Custom,
}

impl ErrorSource {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Console => "console",
            Self::Logger => "logger",
            Self::Network => "network",
            Self::Source => "source",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic produced inside the SDK.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawDiagnostic {
    /// When the diagnostic was produced.
    pub clocks: Clocks,
    /// Human-readable message.
    pub message: String,
    /// Attribution; [`ErrorSource::Agent`] for SDK-internal diagnostics.
    pub source: ErrorSource,
    /// Rendered stack, when one is available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Callback receiving SDK diagnostics.
pub type DiagnosticReporter = Arc<dyn Fn(RawDiagnostic) + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
