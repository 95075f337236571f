//! Console collection.
//!
//! Subscribes the configured console apis through the core registry and
//! republishes every record as a raw log on the life-cycle bus, where the
//! assembler picks it up like any other observation.

use std::sync::Arc;

use lookout_core::console::{ConsoleApi, ConsoleRecord, ConsoleRegistry};
use lookout_core::events::{LogErrorDetails, RawLogCollected, RawLogEvent, StatusType};
use lookout_core::lifecycle::{LifeCycle, LifecycleEvent};
use lookout_core::observable::Subscription;
use lookout_core::telemetry::ErrorSource;
use lookout_core::time::Clock;

use crate::configuration::LogsConfiguration;

/// The severity a console api maps to.
#[must_use]
pub const fn status_for_api(api: ConsoleApi) -> StatusType {
    match api {
        ConsoleApi::Debug => StatusType::Debug,
        ConsoleApi::Log | ConsoleApi::Info => StatusType::Info,
        ConsoleApi::Warn => StatusType::Warn,
        ConsoleApi::Error => StatusType::Error,
    }
}

/// The running console collector.
#[derive(Debug)]
pub struct ConsoleCollector {
    subscription: Option<Subscription>,
}

impl ConsoleCollector {
    /// Detach from the console registry. Idempotent.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

/// Start forwarding the configured console apis as raw logs.
pub fn start_console_collection(
    clock: Clock,
    configuration: &LogsConfiguration,
    registry: &ConsoleRegistry,
    life_cycle: &Arc<LifeCycle>,
) -> ConsoleCollector {
    let observable = registry.observable(&configuration.forward_console_logs);
    let subscription = observable.subscribe({
        let life_cycle = Arc::clone(life_cycle);
        move |record: &ConsoleRecord| {
            let error = (record.stack.is_some() || record.fingerprint.is_some()).then(|| {
                LogErrorDetails {
                    kind: None,
                    stack: record.stack.clone(),
                    fingerprint: record.fingerprint.clone(),
                }
            });
            life_cycle.notify(LifecycleEvent::RawLogCollected(RawLogCollected {
                raw: RawLogEvent {
                    date: clock.timestamp_now(),
                    message: record.message.clone(),
                    status: status_for_api(record.api),
                    origin: ErrorSource::Console,
                    error,
                },
                message_context: None,
                saved_common_context: None,
            }));
        }
    });
    ConsoleCollector {
        subscription: Some(subscription),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
