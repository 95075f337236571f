//! # lookout-logs
//!
//! Log collection and event assembly for the Lookout telemetry SDK:
//!
//! - **Configuration**: validated logs configuration with a programmatic
//!   `before_send` hook
//! - **Console collector**: republishes instrumented console records as
//!   raw logs on the bus
//! - **Assembly**: session resolution, context precedence, rate limiting
//!   and the `before_send` hook, ending in a finalized event on the
//!   collected channel

#![deny(unsafe_code)]

pub mod assembly;
pub mod boot;
pub mod configuration;
pub mod console_collector;

pub use assembly::{LogsAssembly, start_logs_assembly};
pub use boot::{LogsHandle, start_logs};
pub use configuration::{
    BeforeSend, DEFAULT_EVENT_RATE_LIMITER_THRESHOLD, DEFAULT_MAX_BATCH_SIZE, LogsConfiguration,
    LogsInitConfiguration, validate_and_build_logs_configuration,
};
pub use console_collector::{ConsoleCollector, start_console_collection, status_for_api};
