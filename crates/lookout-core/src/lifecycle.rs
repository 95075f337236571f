//! The life-cycle bus.
//!
//! A typed multi-channel event bus decoupling collectors from the
//! assembler: each [`LifecycleEventKind`] is backed by exactly one
//! [`Observable`], so notifications of one kind are FIFO and fully
//! synchronous while kinds stay independent of each other. The payload
//! enumeration is closed; [`LifecycleEvent::kind`] is an exhaustive match,
//! so adding a kind without routing it is a compile error.

use crate::events::{
    LogsEvent, RawLogCollected, RequestCompleteEvent, RequestStartEvent, ViewCreatedEvent,
    ViewEndedEvent,
};
use crate::observable::{Observable, Subscription};
use crate::performance::PerformanceEntry;

/// The closed set of bus channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEventKind {
    /// A raw log observation was collected.
    RawLogCollected,
    /// A finalized log event is ready for hand-off.
    LogCollected,
    /// A new view started tracking.
    ViewCreated,
    /// The current view stopped tracking.
    ViewEnded,
    /// The session was renewed.
    SessionRenewed,
    /// A batch of performance entries was observed.
    PerformanceEntriesCollected,
    /// A network request started.
    RequestStarted,
    /// A network request completed.
    RequestCompleted,
}

impl LifecycleEventKind {
    /// Every kind, in channel order.
    pub const ALL: [Self; 8] = [
        Self::RawLogCollected,
        Self::LogCollected,
        Self::ViewCreated,
        Self::ViewEnded,
        Self::SessionRenewed,
        Self::PerformanceEntriesCollected,
        Self::RequestStarted,
        Self::RequestCompleted,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

/// A payload on the life-cycle bus.
#[derive(Clone, Debug)]
pub enum LifecycleEvent {
    /// A raw log observation with its per-call context.
    RawLogCollected(RawLogCollected),
    /// A finalized log event.
    LogCollected(LogsEvent),
    /// A new view started tracking.
    ViewCreated(ViewCreatedEvent),
    /// The current view stopped tracking.
    ViewEnded(ViewEndedEvent),
    /// The session was renewed.
    SessionRenewed,
    /// A batch of performance entries.
    PerformanceEntriesCollected(Vec<PerformanceEntry>),
    /// A network request started.
    RequestStarted(RequestStartEvent),
    /// A network request completed.
    RequestCompleted(RequestCompleteEvent),
}

impl LifecycleEvent {
    /// The channel this payload belongs to.
    #[must_use]
    pub const fn kind(&self) -> LifecycleEventKind {
        match self {
            Self::RawLogCollected(_) => LifecycleEventKind::RawLogCollected,
            Self::LogCollected(_) => LifecycleEventKind::LogCollected,
            Self::ViewCreated(_) => LifecycleEventKind::ViewCreated,
            Self::ViewEnded(_) => LifecycleEventKind::ViewEnded,
            Self::SessionRenewed => LifecycleEventKind::SessionRenewed,
            Self::PerformanceEntriesCollected(_) => LifecycleEventKind::PerformanceEntriesCollected,
            Self::RequestStarted(_) => LifecycleEventKind::RequestStarted,
            Self::RequestCompleted(_) => LifecycleEventKind::RequestCompleted,
        }
    }
}

/// The bus itself: one observable per event kind, living as long as the SDK
/// instance.
#[derive(Debug, Default)]
pub struct LifeCycle {
    channels: [Observable<LifecycleEvent>; LifecycleEventKind::ALL.len()],
}

impl LifeCycle {
    /// Bus with every channel eagerly constructed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one kind. The callback only ever receives payloads of
    /// that kind.
    pub fn subscribe<F>(&self, kind: LifecycleEventKind, callback: F) -> Subscription
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        self.channels[kind.index()].subscribe(callback)
    }

    /// Publish a payload on its kind's channel, synchronously.
    pub fn notify(&self, event: LifecycleEvent) {
        self.channels[event.kind().index()].notify(event);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
