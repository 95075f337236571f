//! Contained execution of user callbacks and collector hooks.
//!
//! A misbehaving `before_send` hook or timer callback must never take the
//! pipeline down with it: [`call_monitored`] contains the panic, reports it
//! through `tracing`, and lets the caller fall back to a policy default.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::error;

/// Run `operation`, containing any panic.
///
/// Returns `Some(value)` on success, `None` when the callback panicked.
pub fn call_monitored<R>(context: &str, operation: impl FnOnce() -> R) -> Option<R> {
    match catch_unwind(AssertUnwindSafe(operation)) {
        Ok(value) => Some(value),
        Err(payload) => {
            error!(context, message = %panic_message(payload.as_ref()), "contained a panicking callback");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
