//! Configuration errors.
//!
//! Runtime event flow is infallible by design — discards are policy
//! outcomes, not errors. The only fallible surface is configuration
//! validation, which fails closed: on error no collector or assembler is
//! ever constructed.

use thiserror::Error;

/// A configuration value the SDK refuses to start with.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// An excluded-activity-URL pattern failed to compile.
    #[error("invalid excluded activity url pattern `{pattern}`: {source}")]
    InvalidUrlPattern {
        /// The offending pattern.
        pattern: String,
        /// The compile failure.
        #[source]
        source: Box<regex::Error>,
    },

    /// `eventRateLimiterThreshold` must be greater than zero.
    #[error("`eventRateLimiterThreshold` must be greater than zero")]
    InvalidRateLimiterThreshold,

    /// `maxBatchSize` must be greater than zero.
    #[error("`maxBatchSize` must be greater than zero")]
    InvalidBatchSize,
}
