//! Context values and precedence-correct merging.
//!
//! A [`Context`] is a JSON object map. Layers of context are merged with
//! [`combine`], a recursive deep merge where:
//!
//! - objects are merged per key (higher-precedence layer wins),
//! - arrays and primitives are replaced entirely,
//! - `null` values in the higher-precedence layer are skipped.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::time::RelativeTime;
use crate::user::User;

/// A JSON object map of customer-supplied context.
pub type Context = serde_json::Map<String, Value>;

/// A single context value.
pub type ContextValue = Value;

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
#[must_use]
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_value) in source_map {
                if source_value.is_null() {
                    continue;
                }
                let merged = if let Some(target_value) = target_map.remove(&key) {
                    deep_merge(target_value, source_value)
                } else {
                    source_value
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Merge context layers in ascending precedence: every layer deep-merges
/// over the result of the previous ones.
#[must_use]
pub fn combine<I>(layers: I) -> Context
where
    I: IntoIterator<Item = Context>,
{
    let mut merged = Value::Object(Context::new());
    for layer in layers {
        merged = deep_merge(merged, Value::Object(layer));
    }
    match merged {
        Value::Object(map) => map,
        _ => Context::new(),
    }
}

/// The ambient data attached to every event: the page the event happened
/// on, the customer's global context, and the ambient user.
#[derive(Clone, Debug, Default)]
pub struct CommonContext {
    /// Page the observation was made on.
    pub view: PageReference,
    /// Customer-supplied global context.
    pub context: Context,
    /// Ambient user.
    pub user: User,
}

/// The page an observation was made on.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PageReference {
    /// Referrer of the page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// URL of the page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PageReference {
    /// Render as a context object.
    #[must_use]
    pub fn to_context(&self) -> Context {
        let mut context = Context::new();
        if let Some(referrer) = &self.referrer {
            let _ = context.insert("referrer".to_owned(), Value::String(referrer.clone()));
        }
        if let Some(url) = &self.url {
            let _ = context.insert("url".to_owned(), Value::String(url.clone()));
        }
        context
    }
}

/// Provider of the common context, called once per raw event when no saved
/// common context accompanies it.
pub type CommonContextProvider = Arc<dyn Fn() -> CommonContext + Send + Sync>;

/// Lookup of the ambient internal context (view, feature flags, ...) at the
/// time an event was observed.
pub type InternalContextProvider = Arc<dyn Fn(Option<RelativeTime>) -> Option<Context> + Send + Sync>;

/// Store for the customer-supplied global context.
///
/// Snapshot semantics: readers get a clone, mutations go through the
/// dedicated methods.
#[derive(Debug, Default)]
pub struct ContextManager {
    context: Mutex<Context>,
}

impl ContextManager {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current context.
    #[must_use]
    pub fn get_context(&self) -> Context {
        self.context.lock().clone()
    }

    /// Replace the whole context.
    pub fn set_context(&self, context: Context) {
        *self.context.lock() = context;
    }

    /// Set a single property.
    pub fn set_context_property(&self, key: impl Into<String>, value: ContextValue) {
        let _ = self.context.lock().insert(key.into(), value);
    }

    /// Remove a single property.
    pub fn remove_context_property(&self, key: &str) {
        let _ = self.context.lock().remove(key);
    }

    /// Clear the whole context.
    pub fn clear_context(&self) {
        self.context.lock().clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
