//! URL matchers.
//!
//! Activity exclusion lists accept three matcher shapes: an exact string,
//! a compiled regular expression, or an arbitrary predicate.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::errors::ConfigurationError;

/// One way of matching a URL.
#[derive(Clone)]
pub enum MatchOption {
    /// Matches the exact string.
    Exact(String),
    /// Matches when the pattern finds a match anywhere in the URL.
    Pattern(Regex),
    /// Matches when the predicate returns `true`.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl MatchOption {
    /// Compile a regex pattern matcher.
    pub fn pattern(pattern: &str) -> Result<Self, ConfigurationError> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|source| ConfigurationError::InvalidUrlPattern {
                pattern: pattern.to_owned(),
                source: Box::new(source),
            })
    }

    /// Whether `url` matches.
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == url,
            Self::Pattern(pattern) => pattern.is_match(url),
            Self::Predicate(predicate) => predicate(url),
        }
    }
}

impl fmt::Debug for MatchOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(exact) => f.debug_tuple("Exact").field(exact).finish(),
            Self::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for MatchOption {
    fn from(exact: &str) -> Self {
        Self::Exact(exact.to_owned())
    }
}

impl From<String> for MatchOption {
    fn from(exact: String) -> Self {
        Self::Exact(exact)
    }
}

impl From<Regex> for MatchOption {
    fn from(pattern: Regex) -> Self {
        Self::Pattern(pattern)
    }
}

/// A list of matchers, matching when any member matches.
#[derive(Clone, Debug, Default)]
pub struct MatchList {
    matchers: Vec<MatchOption>,
}

impl MatchList {
    /// List over the given matchers.
    #[must_use]
    pub fn new(matchers: Vec<MatchOption>) -> Self {
        Self { matchers }
    }

    /// Append a matcher, keeping the existing evaluation order.
    pub fn push(&mut self, matcher: MatchOption) {
        self.matchers.push(matcher);
    }

    /// Whether any matcher matches `url`.
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        self.matchers.iter().any(|matcher| matcher.matches(url))
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl FromIterator<MatchOption> for MatchList {
    fn from_iter<I: IntoIterator<Item = MatchOption>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
