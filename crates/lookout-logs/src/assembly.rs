//! Event assembly.
//!
//! On every raw log published on the bus, the assembler:
//!
//! 1. resolves the tracked session at the event time and discards the
//!    event when it is untracked (or expired, unless configured otherwise);
//! 2. takes the saved common context when one accompanies the event,
//!    replacing the ambient one wholesale;
//! 3. merges the context layers in ascending precedence: base fields,
//!    global context, internal context at the event time, the raw event's
//!    own fields, then the per-call message context;
//! 4. invokes the `before_send` hook under a monitored context — an
//!    explicit `false` discards, a contained panic lets the event through;
//! 5. applies per-status rate limiting (agent-origin events bypass it;
//!    events discarded by `before_send` never consume quota);
//! 6. publishes the finalized event on the collected channel.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use lookout_core::context::{CommonContextProvider, Context, InternalContextProvider, combine};
use lookout_core::events::{LogsEvent, StatusType};
use lookout_core::lifecycle::{LifeCycle, LifecycleEvent, LifecycleEventKind};
use lookout_core::limiter::EventRateLimiter;
use lookout_core::monitor::call_monitored;
use lookout_core::observable::Subscription;
use lookout_core::session::{SessionLookup, SessionLookupOptions};
use lookout_core::telemetry::{DiagnosticReporter, ErrorSource};
use lookout_core::time::Clock;

use crate::configuration::LogsConfiguration;

/// Events whose merged status is not a known one share this limiter key.
const CUSTOM_STATUS: &str = "custom";

struct LogRateLimiters {
    by_status: HashMap<&'static str, EventRateLimiter>,
    custom: EventRateLimiter,
}

impl LogRateLimiters {
    fn new(threshold: usize, report_diagnostic: &DiagnosticReporter) -> Self {
        let by_status = StatusType::ALL
            .iter()
            .map(|status| {
                (
                    status.as_str(),
                    EventRateLimiter::new(status.as_str(), threshold, Arc::clone(report_diagnostic)),
                )
            })
            .collect();
        Self {
            by_status,
            custom: EventRateLimiter::new(CUSTOM_STATUS, threshold, Arc::clone(report_diagnostic)),
        }
    }

    fn for_status(&self, status: &str) -> &EventRateLimiter {
        self.by_status.get(status).unwrap_or(&self.custom)
    }
}

/// The running assembler.
#[derive(Debug)]
pub struct LogsAssembly {
    subscription: Option<Subscription>,
}

impl LogsAssembly {
    /// Detach from the bus. Idempotent.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

/// Start assembling raw logs into finalized events.
pub fn start_logs_assembly(
    clock: Clock,
    configuration: Arc<LogsConfiguration>,
    session: Arc<dyn SessionLookup>,
    life_cycle: &Arc<LifeCycle>,
    build_common_context: CommonContextProvider,
    get_internal_context: InternalContextProvider,
    report_diagnostic: DiagnosticReporter,
) -> LogsAssembly {
    let limiters = LogRateLimiters::new(configuration.event_rate_limiter_threshold, &report_diagnostic);

    let subscription = life_cycle.subscribe(LifecycleEventKind::RawLogCollected, {
        let life_cycle = Arc::clone(life_cycle);
        move |event| {
            let LifecycleEvent::RawLogCollected(collected) = event else {
                return;
            };
            let start_time = clock.relative_from_timestamp(collected.raw.date);

            let active_session =
                session.find_tracked_session(Some(start_time), SessionLookupOptions::default());
            if active_session.is_none() {
                if !configuration.send_logs_after_session_expiration {
                    return;
                }
                let expired_session = session.find_tracked_session(
                    Some(start_time),
                    SessionLookupOptions { return_inactive: true },
                );
                if expired_session.is_none() {
                    return;
                }
            }

            let common_context = collected
                .saved_common_context
                .clone()
                .unwrap_or_else(|| build_common_context());

            let mut base = Context::new();
            if let Some(service) = &configuration.service {
                let _ = base.insert("service".to_owned(), Value::String(service.clone()));
            }
            if let Some(session_id) = active_session.as_ref().and_then(|session| session.id.as_ref()) {
                let _ = base.insert(
                    "session_id".to_owned(),
                    Value::String(session_id.as_str().to_owned()),
                );
            }
            if !common_context.user.is_empty() {
                let _ = base.insert("usr".to_owned(), Value::Object(common_context.user.to_context()));
            }
            let _ = base.insert("view".to_owned(), Value::Object(common_context.view.to_context()));

            let mut log: LogsEvent = combine(
                [
                    Some(base),
                    Some(common_context.context),
                    get_internal_context(Some(start_time)),
                    Some(collected.raw.to_context()),
                    collected.message_context.clone(),
                ]
                .into_iter()
                .flatten(),
            );

            if let Some(before_send) = &configuration.before_send {
                let verdict = call_monitored("before_send", || before_send(&mut log));
                if verdict == Some(false) {
                    return;
                }
            }

            let is_agent_origin =
                log.get("origin").and_then(Value::as_str) == Some(ErrorSource::Agent.as_str());
            if !is_agent_origin {
                let status = log
                    .get("status")
                    .and_then(Value::as_str)
                    .unwrap_or(CUSTOM_STATUS)
                    .to_owned();
                if limiters.for_status(&status).is_limit_reached(clock.clocks_now()) {
                    return;
                }
            }

            life_cycle.notify(LifecycleEvent::LogCollected(log));
        }
    });

    LogsAssembly {
        subscription: Some(subscription),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{LogsInitConfiguration, validate_and_build_logs_configuration};
    use lookout_core::context::{CommonContext, PageReference};
    use lookout_core::events::{RawLogCollected, RawLogEvent};
    use lookout_core::ids::SessionId;
    use lookout_core::session::TrackedSession;
    use lookout_core::telemetry::RawDiagnostic;
    use lookout_core::time::{RelativeTime, TimeStamp};
    use lookout_core::user::User;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    const SESSION_ID: &str = "session-id";

    struct MockSession {
        tracked: AtomicBool,
        active: AtomicBool,
    }

    impl MockSession {
        fn new() -> Self {
            Self {
                tracked: AtomicBool::new(true),
                active: AtomicBool::new(true),
            }
        }
    }

    impl SessionLookup for MockSession {
        fn find_tracked_session(
            &self,
            _start_time: Option<RelativeTime>,
            options: SessionLookupOptions,
        ) -> Option<TrackedSession> {
            let tracked = self.tracked.load(Ordering::SeqCst);
            let active = self.active.load(Ordering::SeqCst);
            if (active && tracked) || options.return_inactive {
                Some(TrackedSession {
                    id: tracked.then(|| SessionId::from(SESSION_ID)),
                })
            } else {
                None
            }
        }
    }

    fn default_message() -> RawLogEvent {
        RawLogEvent {
            date: TimeStamp::from_millis(123_456),
            message: "message".to_owned(),
            status: StatusType::Info,
            origin: ErrorSource::Logger,
            error: None,
        }
    }

    fn common_context() -> CommonContext {
        CommonContext {
            view: PageReference {
                referrer: Some("referrer_from_common_context".to_owned()),
                url: Some("url_from_common_context".to_owned()),
            },
            context: serde_json::from_value(json!({"common_context_key": "common_context_value"}))
                .unwrap(),
            user: User::default(),
        }
    }

    fn common_context_with_user() -> CommonContext {
        CommonContext {
            user: User {
                id: Some("id".to_owned()),
                name: Some("name".to_owned()),
                email: Some("test@test.com".to_owned()),
                custom: Context::new(),
            },
            ..common_context()
        }
    }

    #[derive(Default)]
    struct HarnessOptions {
        before_send: Option<crate::configuration::BeforeSend>,
        common: Option<CommonContextProvider>,
        internal: Option<InternalContextProvider>,
        threshold: Option<usize>,
        send_after_expiration: bool,
    }

    struct Harness {
        life_cycle: Arc<LifeCycle>,
        collected: Arc<Mutex<Vec<LogsEvent>>>,
        reported: Arc<Mutex<Vec<RawDiagnostic>>>,
        session: Arc<MockSession>,
        assembly: LogsAssembly,
    }

    impl Harness {
        fn notify(&self, collected: RawLogCollected) {
            self.life_cycle
                .notify(LifecycleEvent::RawLogCollected(collected));
        }

        fn notify_raw(&self, raw: RawLogEvent) {
            self.notify(RawLogCollected {
                raw,
                message_context: None,
                saved_common_context: None,
            });
        }

        fn logs(&self) -> Vec<LogsEvent> {
            self.collected.lock().clone()
        }
    }

    fn harness(options: HarnessOptions) -> Harness {
        let clock = Clock::with_origin(TimeStamp::from_millis(0));
        let life_cycle = Arc::new(LifeCycle::new());
        let collected = Arc::new(Mutex::new(Vec::new()));
        let reported = Arc::new(Mutex::new(Vec::new()));
        let session = Arc::new(MockSession::new());

        let _ = life_cycle.subscribe(LifecycleEventKind::LogCollected, {
            let collected = Arc::clone(&collected);
            move |event| {
                if let LifecycleEvent::LogCollected(log) = event {
                    collected.lock().push(log.clone());
                }
            }
        });

        let mut configuration = validate_and_build_logs_configuration(&LogsInitConfiguration {
            service: Some("service".to_owned()),
            send_logs_after_session_expiration: options.send_after_expiration,
            event_rate_limiter_threshold: options.threshold,
            ..LogsInitConfiguration::default()
        })
        .unwrap();
        configuration.before_send = options.before_send;

        let assembly = start_logs_assembly(
            clock,
            Arc::new(configuration),
            Arc::clone(&session) as Arc<dyn SessionLookup>,
            &life_cycle,
            options.common.unwrap_or_else(|| Arc::new(common_context)),
            options.internal.unwrap_or_else(|| Arc::new(|_| None)),
            {
                let reported = Arc::clone(&reported);
                Arc::new(move |diagnostic| reported.lock().push(diagnostic))
            },
        );

        Harness {
            life_cycle,
            collected,
            reported,
            session,
            assembly,
        }
    }

    // ── before_send verdicts ────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn sends_when_before_send_returns_true() {
        let h = harness(HarnessOptions {
            before_send: Some(Arc::new(|_| true)),
            ..HarnessOptions::default()
        });
        h.notify_raw(default_message());
        assert_eq!(h.logs().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_send_when_before_send_returns_false() {
        let h = harness(HarnessOptions {
            before_send: Some(Arc::new(|_| false)),
            ..HarnessOptions::default()
        });
        h.notify_raw(default_message());
        assert!(h.logs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn a_panicking_before_send_is_contained_and_the_event_proceeds() {
        let h = harness(HarnessOptions {
            before_send: Some(Arc::new(|_| panic!("hook exploded"))),
            ..HarnessOptions::default()
        });
        h.notify_raw(default_message());
        assert_eq!(h.logs().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn before_send_mutations_are_preserved() {
        let h = harness(HarnessOptions {
            before_send: Some(Arc::new(|log: &mut LogsEvent| {
                let _ = log.insert("message".to_owned(), json!("modified message"));
                let _ = log.insert("foo".to_owned(), json!("bar"));
                true
            })),
            ..HarnessOptions::default()
        });
        h.notify_raw(default_message());
        let logs = h.logs();
        assert_eq!(logs[0]["message"], json!("modified message"));
        assert_eq!(logs[0]["foo"], json!("bar"));
    }

    // ── event generation conditions ─────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn does_not_send_when_the_session_is_not_tracked() {
        let h = harness(HarnessOptions::default());
        h.session.tracked.store(false, Ordering::SeqCst);
        h.notify_raw(default_message());
        assert!(h.logs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sends_with_the_session_id_while_the_session_is_active() {
        let h = harness(HarnessOptions::default());
        h.notify_raw(default_message());
        let logs = h.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["session_id"], json!(SESSION_ID));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_session_discards_unless_configured() {
        let h = harness(HarnessOptions::default());
        h.session.active.store(false, Ordering::SeqCst);
        h.notify_raw(default_message());
        assert!(h.logs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_session_sends_without_a_session_id_when_configured() {
        let h = harness(HarnessOptions {
            send_after_expiration: true,
            ..HarnessOptions::default()
        });
        h.session.active.store(false, Ordering::SeqCst);
        h.notify_raw(default_message());
        let logs = h.logs();
        assert_eq!(logs.len(), 1);
        assert!(!logs[0].contains_key("session_id"));
    }

    #[tokio::test(start_paused = true)]
    async fn tracking_changes_gate_the_sending() {
        let h = harness(HarnessOptions::default());
        h.notify_raw(default_message());
        assert_eq!(h.logs().len(), 1);

        h.session.tracked.store(false, Ordering::SeqCst);
        h.notify_raw(default_message());
        assert_eq!(h.logs().len(), 1);

        h.session.tracked.store(true, Ordering::SeqCst);
        h.notify_raw(default_message());
        assert_eq!(h.logs().len(), 2);
    }

    // ── context inclusion ───────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn includes_the_message_context() {
        let h = harness(HarnessOptions::default());
        h.notify(RawLogCollected {
            raw: default_message(),
            message_context: Some(
                serde_json::from_value(json!({"foo": "from-message-context"})).unwrap(),
            ),
            saved_common_context: None,
        });
        assert_eq!(h.logs()[0]["foo"], json!("from-message-context"));
    }

    #[tokio::test(start_paused = true)]
    async fn includes_the_common_context() {
        let h = harness(HarnessOptions::default());
        h.notify_raw(default_message());
        let logs = h.logs();
        assert_eq!(
            logs[0]["view"],
            json!({
                "referrer": "referrer_from_common_context",
                "url": "url_from_common_context",
            })
        );
        assert_eq!(logs[0]["common_context_key"], json!("common_context_value"));
    }

    #[tokio::test(start_paused = true)]
    async fn a_saved_common_context_replaces_the_ambient_one_wholesale() {
        let h = harness(HarnessOptions::default());
        h.notify(RawLogCollected {
            raw: default_message(),
            message_context: None,
            saved_common_context: Some(CommonContext {
                view: PageReference {
                    referrer: Some("referrer_from_saved_common_context".to_owned()),
                    url: Some("url_from_saved_common_context".to_owned()),
                },
                context: serde_json::from_value(json!({"foo": "bar"})).unwrap(),
                user: User {
                    email: Some("test@test.com".to_owned()),
                    ..User::default()
                },
            }),
        });
        let logs = h.logs();
        assert_eq!(
            logs[0]["view"],
            json!({
                "referrer": "referrer_from_saved_common_context",
                "url": "url_from_saved_common_context",
            })
        );
        assert_eq!(logs[0]["foo"], json!("bar"));
        assert!(!logs[0].contains_key("common_context_key"));
    }

    #[tokio::test(start_paused = true)]
    async fn includes_the_internal_context_resolved_at_the_event_time() {
        let h = harness(HarnessOptions {
            internal: Some(Arc::new(|start_time| {
                let marker = if start_time == Some(RelativeTime::from_millis(1234)) {
                    "b"
                } else {
                    "a"
                };
                Some(serde_json::from_value(json!({"foo": marker})).unwrap())
            })),
            ..HarnessOptions::default()
        });
        h.notify_raw(RawLogEvent {
            date: TimeStamp::from_millis(1234),
            ..default_message()
        });
        assert_eq!(h.logs()[0]["foo"], json!("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn the_internal_view_merges_over_the_common_view() {
        let h = harness(HarnessOptions {
            internal: Some(Arc::new(|_| {
                Some(
                    serde_json::from_value(
                        json!({"view": {"url": "http://from-rum-context.com", "id": "view-id"}}),
                    )
                    .unwrap(),
                )
            })),
            ..HarnessOptions::default()
        });
        h.notify_raw(default_message());
        assert_eq!(
            h.logs()[0]["view"],
            json!({
                "id": "view-id",
                "url": "http://from-rum-context.com",
                "referrer": "referrer_from_common_context",
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn includes_the_raw_log_fields() {
        let h = harness(HarnessOptions::default());
        h.notify_raw(default_message());
        let logs = h.logs();
        assert_eq!(logs[0]["date"], json!(123_456));
        assert_eq!(logs[0]["message"], json!("message"));
        assert_eq!(logs[0]["status"], json!("info"));
        assert_eq!(logs[0]["origin"], json!("logger"));
        assert_eq!(logs[0]["service"], json!("service"));
    }

    // ── context precedence ──────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn the_common_context_wins_over_service_and_session_id() {
        let h = harness(HarnessOptions::default());
        h.notify(RawLogCollected {
            raw: default_message(),
            message_context: None,
            saved_common_context: Some(CommonContext {
                context: serde_json::from_value(json!({"service": "foo", "session_id": "bar"}))
                    .unwrap(),
                ..common_context()
            }),
        });
        let logs = h.logs();
        assert_eq!(logs[0]["service"], json!("foo"));
        assert_eq!(logs[0]["session_id"], json!("bar"));
    }

    #[tokio::test(start_paused = true)]
    async fn the_internal_context_wins_over_the_common_context() {
        let h = harness(HarnessOptions {
            internal: Some(Arc::new(|_| {
                Some(serde_json::from_value(json!({"common_context_key": "from-internal"})).unwrap())
            })),
            ..HarnessOptions::default()
        });
        h.notify_raw(default_message());
        assert_eq!(h.logs()[0]["common_context_key"], json!("from-internal"));
    }

    #[tokio::test(start_paused = true)]
    async fn the_raw_log_wins_over_the_internal_context() {
        let h = harness(HarnessOptions {
            internal: Some(Arc::new(|_| {
                Some(serde_json::from_value(json!({"message": "from-internal-context"})).unwrap())
            })),
            ..HarnessOptions::default()
        });
        h.notify_raw(default_message());
        assert_eq!(h.logs()[0]["message"], json!("message"));
    }

    #[tokio::test(start_paused = true)]
    async fn the_message_context_wins_over_the_raw_log() {
        let h = harness(HarnessOptions::default());
        h.notify(RawLogCollected {
            raw: default_message(),
            message_context: Some(
                serde_json::from_value(json!({"message": "from-message-context"})).unwrap(),
            ),
            saved_common_context: None,
        });
        assert_eq!(h.logs()[0]["message"], json!("from-message-context"));
    }

    // ── user management ─────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn no_usr_key_when_the_user_is_not_set() {
        let h = harness(HarnessOptions::default());
        h.notify_raw(default_message());
        assert!(!h.logs()[0].contains_key("usr"));
    }

    #[tokio::test(start_paused = true)]
    async fn includes_the_user_when_set() {
        let h = harness(HarnessOptions {
            common: Some(Arc::new(common_context_with_user)),
            ..HarnessOptions::default()
        });
        h.notify_raw(default_message());
        assert_eq!(
            h.logs()[0]["usr"],
            json!({"id": "id", "name": "name", "email": "test@test.com"})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn the_global_context_usr_wins_over_the_ambient_user() {
        let h = harness(HarnessOptions {
            common: Some(Arc::new(|| {
                let mut context = common_context_with_user();
                let _ = context.context.insert(
                    "usr".to_owned(),
                    json!({"id": 4242, "name": "solution"}),
                );
                context
            })),
            ..HarnessOptions::default()
        });
        h.notify_raw(default_message());
        assert_eq!(
            h.logs()[0]["usr"],
            json!({"id": 4242, "name": "solution", "email": "test@test.com"})
        );
    }

    // ── rate limiting ───────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn agent_logs_bypass_the_rate_limit() {
        let h = harness(HarnessOptions {
            threshold: Some(1),
            ..HarnessOptions::default()
        });
        for message in ["foo", "bar"] {
            h.notify_raw(RawLogEvent {
                origin: ErrorSource::Agent,
                status: StatusType::Error,
                message: message.to_owned(),
                ..default_message()
            });
        }
        let logs = h.logs();
        assert_eq!(logs.len(), 2);
        assert!(h.reported.lock().is_empty());
        assert_eq!(logs[0]["message"], json!("foo"));
        assert_eq!(logs[1]["message"], json!("bar"));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_sending_when_reaching_the_limit() {
        for status in StatusType::ALL {
            let h = harness(HarnessOptions {
                threshold: Some(1),
                ..HarnessOptions::default()
            });
            h.notify_raw(RawLogEvent {
                message: "foo".to_owned(),
                status,
                ..default_message()
            });
            h.notify_raw(RawLogEvent {
                message: "bar".to_owned(),
                status,
                ..default_message()
            });

            let logs = h.logs();
            assert_eq!(logs.len(), 1);
            assert_eq!(logs[0]["message"], json!("foo"));
            let reported = h.reported.lock();
            assert_eq!(reported.len(), 1);
            assert_eq!(
                reported[0].message,
                format!("Reached max number of {status}s by minute: 1")
            );
            assert_eq!(reported[0].source, ErrorSource::Agent);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn a_message_context_status_overrides_the_limiter_key() {
        let h = harness(HarnessOptions {
            threshold: Some(1),
            ..HarnessOptions::default()
        });
        let unknown_status = Some(serde_json::from_value(json!({"status": "unknown"})).unwrap());
        h.notify(RawLogCollected {
            raw: default_message(),
            message_context: unknown_status.clone(),
            saved_common_context: None,
        });
        h.notify(RawLogCollected {
            raw: default_message(),
            message_context: unknown_status,
            saved_common_context: None,
        });

        assert_eq!(h.logs().len(), 1);
        let reported = h.reported.lock();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].message, "Reached max number of customs by minute: 1");
    }

    #[tokio::test(start_paused = true)]
    async fn events_discarded_by_before_send_do_not_consume_quota() {
        let h = harness(HarnessOptions {
            threshold: Some(1),
            before_send: Some(Arc::new(|log: &mut LogsEvent| {
                log.get("message").and_then(Value::as_str) != Some("discard me")
            })),
            ..HarnessOptions::default()
        });
        for _ in 0..3 {
            h.notify_raw(RawLogEvent {
                message: "discard me".to_owned(),
                ..default_message()
            });
        }
        h.notify_raw(RawLogEvent {
            message: "foo".to_owned(),
            ..default_message()
        });

        let logs = h.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["message"], json!("foo"));
    }

    #[tokio::test(start_paused = true)]
    async fn new_events_are_admitted_after_a_minute() {
        let h = harness(HarnessOptions {
            threshold: Some(1),
            ..HarnessOptions::default()
        });
        h.notify_raw(RawLogEvent {
            message: "foo".to_owned(),
            ..default_message()
        });
        h.notify_raw(RawLogEvent {
            message: "bar".to_owned(),
            ..default_message()
        });
        tokio::time::advance(Duration::from_secs(60)).await;
        h.notify_raw(RawLogEvent {
            message: "baz".to_owned(),
            ..default_message()
        });

        let logs = h.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0]["message"], json!("foo"));
        assert_eq!(logs[1]["message"], json!("baz"));
        assert_eq!(h.reported.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn a_different_status_is_not_affected_by_the_limit() {
        let h = harness(HarnessOptions {
            threshold: Some(1),
            ..HarnessOptions::default()
        });
        h.notify_raw(RawLogEvent {
            message: "foo".to_owned(),
            status: StatusType::Error,
            ..default_message()
        });
        h.notify_raw(RawLogEvent {
            message: "bar".to_owned(),
            status: StatusType::Error,
            ..default_message()
        });
        h.notify_raw(RawLogEvent {
            message: "baz".to_owned(),
            status: StatusType::Info,
            ..default_message()
        });

        let logs = h.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0]["message"], json!("foo"));
        assert_eq!(logs[1]["message"], json!("baz"));
    }

    #[tokio::test(start_paused = true)]
    async fn two_unknown_statuses_share_the_custom_limiter() {
        let h = harness(HarnessOptions {
            threshold: Some(1),
            ..HarnessOptions::default()
        });
        h.notify(RawLogCollected {
            raw: RawLogEvent {
                message: "foo".to_owned(),
                ..default_message()
            },
            message_context: Some(serde_json::from_value(json!({"status": "foo"})).unwrap()),
            saved_common_context: None,
        });
        h.notify(RawLogCollected {
            raw: RawLogEvent {
                message: "bar".to_owned(),
                ..default_message()
            },
            message_context: Some(serde_json::from_value(json!({"status": "bar"})).unwrap()),
            saved_common_context: None,
        });

        let logs = h.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["message"], json!("foo"));
        assert_eq!(h.reported.lock().len(), 1);
    }

    // ── stop ────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn stop_detaches_the_assembler() {
        let mut h = harness(HarnessOptions::default());
        h.assembly.stop();
        h.notify_raw(default_message());
        assert!(h.logs().is_empty());
        h.assembly.stop();
    }
}
