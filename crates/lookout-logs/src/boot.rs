//! Composition root for log collection.
//!
//! Validates the configuration (failing closed), wires the console
//! collector and the assembler, and hands back one stop handle. The
//! session lookup, common-context provider, internal-context provider and
//! diagnostic reporter are the seams to the external collaborators.

use std::sync::Arc;

use lookout_core::console::ConsoleRegistry;
use lookout_core::context::{CommonContextProvider, InternalContextProvider};
use lookout_core::errors::ConfigurationError;
use lookout_core::lifecycle::LifeCycle;
use lookout_core::session::SessionLookup;
use lookout_core::telemetry::DiagnosticReporter;
use lookout_core::time::Clock;

use crate::assembly::{LogsAssembly, start_logs_assembly};
use crate::configuration::{BeforeSend, LogsInitConfiguration, validate_and_build_logs_configuration};
use crate::console_collector::{ConsoleCollector, start_console_collection};

/// The running logs pipeline.
pub struct LogsHandle {
    console: Option<ConsoleCollector>,
    assembly: LogsAssembly,
}

impl LogsHandle {
    /// Detach collectors and the assembler from the bus. Idempotent.
    pub fn stop(&mut self) {
        if let Some(console) = &mut self.console {
            console.stop();
        }
        self.assembly.stop();
    }
}

impl std::fmt::Debug for LogsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogsHandle").finish_non_exhaustive()
    }
}

/// Validate the configuration and start the logs pipeline.
///
/// Fails closed: on a configuration error nothing is constructed and no
/// event flows.
#[allow(clippy::too_many_arguments)]
pub fn start_logs(
    clock: Clock,
    init_configuration: &LogsInitConfiguration,
    before_send: Option<BeforeSend>,
    session: Arc<dyn SessionLookup>,
    life_cycle: &Arc<LifeCycle>,
    console_registry: &ConsoleRegistry,
    build_common_context: CommonContextProvider,
    get_internal_context: InternalContextProvider,
    report_diagnostic: DiagnosticReporter,
) -> Result<LogsHandle, ConfigurationError> {
    let mut configuration = validate_and_build_logs_configuration(init_configuration)?;
    configuration.before_send = before_send;
    let configuration = Arc::new(configuration);
    tracing::debug!(
        forwarded_console_apis = configuration.forward_console_logs.len(),
        "starting logs collection"
    );

    let console = (!configuration.forward_console_logs.is_empty())
        .then(|| start_console_collection(clock, &configuration, console_registry, life_cycle));

    let assembly = start_logs_assembly(
        clock,
        Arc::clone(&configuration),
        session,
        life_cycle,
        build_common_context,
        get_internal_context,
        report_diagnostic,
    );

    Ok(LogsHandle { console, assembly })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
