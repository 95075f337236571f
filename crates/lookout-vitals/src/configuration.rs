//! Vitals configuration.
//!
//! The init struct is plain data (deserializable from the embedder's
//! configuration payload); validation compiles it into the runtime
//! configuration or fails closed with a [`ConfigurationError`].

use serde::{Deserialize, Serialize};

use lookout_core::errors::ConfigurationError;
use lookout_core::matcher::{MatchList, MatchOption};

/// Vitals configuration as supplied by the embedder.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VitalsInitConfiguration {
    /// URLs excluded from page-activity detection, matched exactly.
    pub excluded_activity_urls: Vec<String>,
    /// URLs excluded from page-activity detection, matched as regexes.
    pub excluded_activity_url_patterns: Vec<String>,
    /// Whether the runtime can observe layout shifts.
    pub layout_shift_supported: bool,
}

/// Validated vitals configuration.
#[derive(Clone, Debug, Default)]
pub struct VitalsConfiguration {
    /// Compiled activity exclusion list.
    pub excluded_activity_urls: MatchList,
    /// Whether the runtime can observe layout shifts.
    pub layout_shift_supported: bool,
}

/// Compile and validate the init configuration.
///
/// Fails closed: on error the trackers are never constructed.
pub fn validate_and_build_vitals_configuration(
    init: &VitalsInitConfiguration,
) -> Result<VitalsConfiguration, ConfigurationError> {
    let mut matchers: Vec<MatchOption> = init
        .excluded_activity_urls
        .iter()
        .map(|url| MatchOption::Exact(url.clone()))
        .collect();
    for pattern in &init.excluded_activity_url_patterns {
        matchers.push(MatchOption::pattern(pattern)?);
    }
    Ok(VitalsConfiguration {
        excluded_activity_urls: MatchList::new(matchers),
        layout_shift_supported: init.layout_shift_supported,
    })
}

impl VitalsConfiguration {
    /// Add a predicate or pre-built matcher to the exclusion list.
    #[must_use]
    pub fn with_excluded_matcher(mut self, matcher: MatchOption) -> Self {
        self.excluded_activity_urls.push(matcher);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
