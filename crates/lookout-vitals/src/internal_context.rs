//! Internal context resolution.
//!
//! The assembler enriches every event with the ambient context that was
//! active when the event was observed: the view and the feature flag
//! evaluations at that time. This resolver is the seam between the
//! trackers and event assembly.

use std::sync::Arc;

use serde_json::Value;

use lookout_core::context::{Context, InternalContextProvider};
use lookout_core::time::RelativeTime;

use crate::feature_flags::FeatureFlagFinder;
use crate::view_contexts::ViewContextFinder;

/// Resolves the ambient context at a point in time.
#[derive(Clone, Debug)]
pub struct InternalContextResolver {
    views: ViewContextFinder,
    feature_flags: FeatureFlagFinder,
}

impl InternalContextResolver {
    /// Resolver over the given finders.
    #[must_use]
    pub fn new(views: ViewContextFinder, feature_flags: FeatureFlagFinder) -> Self {
        Self { views, feature_flags }
    }

    /// The internal context at `start_time` (or now, when `None`).
    ///
    /// `None` when no view was active at that time.
    #[must_use]
    pub fn resolve(&self, start_time: Option<RelativeTime>) -> Option<Context> {
        let view = self.views.find_view(start_time)?;

        let mut view_context = Context::new();
        let _ = view_context.insert("id".to_owned(), Value::String(view.id.into_inner()));
        if let Some(name) = view.name {
            let _ = view_context.insert("name".to_owned(), Value::String(name));
        }

        let mut context = Context::new();
        let _ = context.insert("view".to_owned(), Value::Object(view_context));
        if let Some(service) = view.service {
            let _ = context.insert("service".to_owned(), Value::String(service));
        }
        if let Some(version) = view.version {
            let _ = context.insert("version".to_owned(), Value::String(version));
        }
        if let Some(evaluations) = self.feature_flags.find_evaluations(start_time) {
            if !evaluations.is_empty() {
                let _ = context.insert("feature_flags".to_owned(), Value::Object(evaluations));
            }
        }
        Some(context)
    }

    /// The resolver as the provider closure consumed by event assembly.
    #[must_use]
    pub fn provider(&self) -> InternalContextProvider {
        let resolver = self.clone();
        Arc::new(move |start_time| resolver.resolve(start_time))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
