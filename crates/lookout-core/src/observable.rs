//! Synchronous publish/subscribe primitive.
//!
//! An [`Observable`] delivers every notified value to every subscriber, in
//! subscription order, on the notifying thread. Delivery iterates over a
//! snapshot of the subscriber list with per-subscriber tombstones, so:
//!
//! - subscribing during a notification does not receive the in-flight value;
//! - unsubscribing during a notification stops further delivery to that
//!   subscriber without disturbing the others;
//! - `notify` may be re-entered from within a callback.
//!
//! An observable built with [`Observable::with_setup`] runs its setup hook
//! when the subscriber count goes from zero to one and the returned
//! [`Teardown`] when it drops back to zero, so collectors only attach to
//! their sources while someone is listening.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::monitor::call_monitored;

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;
type SetupFn<T> = Box<dyn Fn(&Observable<T>) -> Teardown + Send + Sync>;

struct Slot<T> {
    active: AtomicBool,
    callback: Callback<T>,
}

struct Inner<T> {
    slots: Mutex<Vec<Arc<Slot<T>>>>,
    setup: Option<SetupFn<T>>,
    teardown: Mutex<Option<Teardown>>,
}

impl<T> Inner<T> {
    fn unsubscribe_slot(self: &Arc<Self>, slot: &Arc<Slot<T>>) {
        if !slot.active.swap(false, Ordering::SeqCst) {
            return;
        }
        let emptied = {
            let mut slots = self.slots.lock();
            slots.retain(|candidate| !Arc::ptr_eq(candidate, slot));
            slots.is_empty()
        };
        if emptied {
            let teardown = self.teardown.lock().take();
            if let Some(teardown) = teardown {
                teardown.run();
            }
        }
    }
}

/// A single-event-type synchronous channel.
pub struct Observable<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("subscribers", &self.inner.slots.lock().len())
            .finish()
    }
}

impl<T: 'static> Observable<T> {
    /// Channel with no lifecycle hook.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(Vec::new()),
                setup: None,
                teardown: Mutex::new(None),
            }),
        }
    }

    /// Channel whose `setup` hook runs on the first subscription and whose
    /// returned [`Teardown`] runs once the last subscriber is gone. The hook
    /// runs again if the subscriber count later returns from zero.
    #[must_use]
    pub fn with_setup<F>(setup: F) -> Self
    where
        F: Fn(&Observable<T>) -> Teardown + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(Vec::new()),
                setup: Some(Box::new(setup)),
                teardown: Mutex::new(None),
            }),
        }
    }

    /// Attach a subscriber. It receives every value notified after this call
    /// until the returned [`Subscription`] is unsubscribed.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let slot = Arc::new(Slot {
            active: AtomicBool::new(true),
            callback: Box::new(callback),
        });
        let first = {
            let mut slots = self.inner.slots.lock();
            slots.push(Arc::clone(&slot));
            slots.len() == 1
        };
        if first {
            if let Some(setup) = &self.inner.setup {
                let teardown = setup(self);
                *self.inner.teardown.lock() = Some(teardown);
            }
        }
        let inner = Arc::clone(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || inner.unsubscribe_slot(&slot))),
        }
    }

    /// Deliver `value` to every current subscriber, synchronously and in
    /// subscription order. A no-op with no subscribers.
    ///
    /// Each callback runs in a monitored context: one panicking subscriber
    /// is contained and does not prevent delivery to the others.
    pub fn notify(&self, value: T) {
        let snapshot: Vec<Arc<Slot<T>>> = self.inner.slots.lock().clone();
        for slot in snapshot {
            if slot.active.load(Ordering::SeqCst) {
                let _ = call_monitored("observable_subscriber", || (slot.callback)(&value));
            }
        }
    }

    /// Whether any subscriber is currently attached.
    #[must_use]
    pub fn has_subscribers(&self) -> bool {
        !self.inner.slots.lock().is_empty()
    }
}

/// Handle detaching one subscriber.
///
/// Dropping the handle without calling [`Subscription::unsubscribe`] leaves
/// the subscriber attached for the lifetime of the observable.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Detach the subscriber. Within an in-flight notification pass this
    /// prevents any further delivery to it.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Subscription")
    }
}

/// Cleanup actions run when an observable loses its last subscriber.
#[must_use]
pub struct Teardown {
    actions: Vec<Box<dyn FnOnce() + Send>>,
}

impl Teardown {
    /// No cleanup.
    pub fn none() -> Self {
        Self { actions: Vec::new() }
    }

    /// Run `action` on teardown.
    pub fn from_fn(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            actions: vec![Box::new(action)],
        }
    }

    /// Release `subscriptions` on teardown.
    pub fn from_subscriptions(subscriptions: Vec<Subscription>) -> Self {
        Self {
            actions: subscriptions
                .into_iter()
                .map(|subscription| Box::new(move || subscription.unsubscribe()) as Box<dyn FnOnce() + Send>)
                .collect(),
        }
    }

    fn run(self) {
        for action in self.actions {
            action();
        }
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Teardown").field("actions", &self.actions.len()).finish()
    }
}

/// One channel republishing every occurrence of the `sources`.
///
/// Sources are only subscribed while the merged channel itself has
/// subscribers.
pub fn merge_observables<T>(sources: Vec<Observable<T>>) -> Observable<T>
where
    T: Clone + 'static,
{
    Observable::with_setup(move |merged| {
        let subscriptions = sources
            .iter()
            .map(|source| {
                let merged = merged.clone();
                source.subscribe(move |value: &T| merged.notify(value.clone()))
            })
            .collect();
        Teardown::from_subscriptions(subscriptions)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
