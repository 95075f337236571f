//! Logs configuration.
//!
//! The init struct is plain data; validation compiles it into the runtime
//! configuration or fails closed with a [`ConfigurationError`]. The
//! `before_send` hook is supplied programmatically, after validation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lookout_core::console::ConsoleApi;
use lookout_core::errors::ConfigurationError;
use lookout_core::events::LogsEvent;

/// Default number of events of one status admitted per minute.
pub const DEFAULT_EVENT_RATE_LIMITER_THRESHOLD: usize = 3000;
/// Default upload batch size (consumed by the transport collaborator).
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

/// Transformation hook invoked with every assembled event before hand-off.
///
/// Returning `false` discards the event; mutations are preserved in the
/// published result.
pub type BeforeSend = Arc<dyn Fn(&mut LogsEvent) -> bool + Send + Sync>;

/// Logs configuration as supplied by the embedder.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogsInitConfiguration {
    /// Service name stamped on every event.
    pub service: Option<String>,
    /// Console apis forwarded as log events. Use [`ConsoleApi::ALL`] to
    /// forward everything.
    pub forward_console_logs: Vec<ConsoleApi>,
    /// Keep sending logs collected right after the session expired.
    pub send_logs_after_session_expiration: bool,
    /// Events of one status admitted per minute.
    pub event_rate_limiter_threshold: Option<usize>,
    /// Upload batch size (consumed by the transport collaborator).
    pub max_batch_size: Option<usize>,
}

/// Validated logs configuration.
#[derive(Clone)]
pub struct LogsConfiguration {
    /// Service name stamped on every event.
    pub service: Option<String>,
    /// Console apis forwarded as log events.
    pub forward_console_logs: Vec<ConsoleApi>,
    /// Keep sending logs collected right after the session expired.
    pub send_logs_after_session_expiration: bool,
    /// Events of one status admitted per minute.
    pub event_rate_limiter_threshold: usize,
    /// Upload batch size (consumed by the transport collaborator).
    pub max_batch_size: usize,
    /// Transformation hook, when one is installed.
    pub before_send: Option<BeforeSend>,
}

impl std::fmt::Debug for LogsConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogsConfiguration")
            .field("service", &self.service)
            .field("forward_console_logs", &self.forward_console_logs)
            .field(
                "send_logs_after_session_expiration",
                &self.send_logs_after_session_expiration,
            )
            .field("event_rate_limiter_threshold", &self.event_rate_limiter_threshold)
            .field("max_batch_size", &self.max_batch_size)
            .field("before_send", &self.before_send.is_some())
            .finish()
    }
}

impl LogsConfiguration {
    /// Install the transformation hook.
    #[must_use]
    pub fn with_before_send(mut self, before_send: BeforeSend) -> Self {
        self.before_send = Some(before_send);
        self
    }
}

/// Compile and validate the init configuration.
///
/// Fails closed: on error no collector or assembler is constructed.
pub fn validate_and_build_logs_configuration(
    init: &LogsInitConfiguration,
) -> Result<LogsConfiguration, ConfigurationError> {
    let event_rate_limiter_threshold = init
        .event_rate_limiter_threshold
        .unwrap_or(DEFAULT_EVENT_RATE_LIMITER_THRESHOLD);
    if event_rate_limiter_threshold == 0 {
        return Err(ConfigurationError::InvalidRateLimiterThreshold);
    }
    let max_batch_size = init.max_batch_size.unwrap_or(DEFAULT_MAX_BATCH_SIZE);
    if max_batch_size == 0 {
        return Err(ConfigurationError::InvalidBatchSize);
    }
    Ok(LogsConfiguration {
        service: init.service.clone(),
        forward_console_logs: init.forward_console_logs.clone(),
        send_logs_after_session_expiration: init.send_logs_after_session_expiration,
        event_rate_limiter_threshold,
        max_batch_size,
        before_send: None,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
