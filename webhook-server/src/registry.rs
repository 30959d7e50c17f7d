//! Event-name to handler mapping and fault-isolated dispatch.
//!
//! # Design
//! Handlers are stored in one registration-ordered list. Dispatch runs the
//! handlers registered for the payload's event first, then the catch-all
//! (`"*"`) handlers, each group in registration order. Every handler is
//! awaited in turn; an `Err` or a panic is logged and the next handler
//! still runs.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use canvas_core::WebhookPayload;
use futures::FutureExt;

use crate::handler::WebhookHandler;

/// Registration key that matches every event.
pub const CATCH_ALL: &str = "*";

/// Outcome of one dispatch, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub invoked: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<(String, Arc<dyn WebhookHandler>)>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `handler` for `event`. Registering the same handler twice runs
    /// it twice.
    pub fn register(&mut self, event: impl Into<String>, handler: impl WebhookHandler + 'static) {
        self.handlers.push((event.into(), Arc::new(handler)));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn matching<'a>(&'a self, event: &'a str) -> impl Iterator<Item = &'a Arc<dyn WebhookHandler>> {
        let specific = self
            .handlers
            .iter()
            .filter(move |(key, _)| key != CATCH_ALL && key == event);
        let catch_all = self.handlers.iter().filter(|(key, _)| key == CATCH_ALL);
        specific.chain(catch_all).map(|(_, handler)| handler)
    }

    pub async fn dispatch(&self, payload: &WebhookPayload) -> DispatchReport {
        let mut report = DispatchReport::default();
        for handler in self.matching(&payload.event) {
            report.invoked += 1;
            let outcome = AssertUnwindSafe(handler.handle(payload)).catch_unwind().await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    report.failed += 1;
                    tracing::error!(
                        event = %payload.event,
                        webhook_id = %payload.id,
                        error = %err,
                        "webhook handler failed"
                    );
                }
                Err(panic) => {
                    report.failed += 1;
                    tracing::error!(
                        event = %payload.event,
                        webhook_id = %payload.id,
                        error = panic_message(&*panic),
                        "webhook handler panicked"
                    );
                }
            }
        }
        report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;

    /// Appends its label to a shared log, then fails or panics on request.
    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        mode: Mode,
    }

    #[derive(Clone, Copy)]
    enum Mode {
        Ok,
        Fail,
        Panic,
    }

    #[async_trait]
    impl WebhookHandler for Recorder {
        async fn handle(&self, _payload: &WebhookPayload) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(self.label);
            match self.mode {
                Mode::Ok => Ok(()),
                Mode::Fail => anyhow::bail!("{} failed", self.label),
                Mode::Panic => panic!("{} panicked", self.label),
            }
        }
    }

    fn payload(event: &str) -> WebhookPayload {
        WebhookPayload {
            id: "evt-1".to_string(),
            event: event.to_string(),
            timestamp: Utc::now(),
            data: Default::default(),
        }
    }

    fn registry(entries: &[(&str, &'static str, Mode)]) -> (HandlerRegistry, Arc<Mutex<Vec<&'static str>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        for &(event, label, mode) in entries {
            registry.register(
                event,
                Recorder {
                    label,
                    log: Arc::clone(&log),
                    mode,
                },
            );
        }
        (registry, log)
    }

    #[tokio::test]
    async fn specific_handlers_run_before_catch_all() {
        let (registry, log) = registry(&[
            (CATCH_ALL, "any", Mode::Ok),
            ("canvas_item_created", "first", Mode::Ok),
            ("canvas_item_deleted", "other", Mode::Ok),
            ("canvas_item_created", "second", Mode::Ok),
        ]);

        let report = registry.dispatch(&payload("canvas_item_created")).await;

        assert_eq!(*log.lock().unwrap(), ["first", "second", "any"]);
        assert_eq!(report, DispatchReport { invoked: 3, failed: 0 });
    }

    #[tokio::test]
    async fn failures_and_panics_are_isolated() {
        let (registry, log) = registry(&[
            ("canvas_item_created", "fails", Mode::Fail),
            ("canvas_item_created", "panics", Mode::Panic),
            (CATCH_ALL, "any", Mode::Ok),
        ]);

        let report = registry.dispatch(&payload("canvas_item_created")).await;

        assert_eq!(*log.lock().unwrap(), ["fails", "panics", "any"]);
        assert_eq!(report, DispatchReport { invoked: 3, failed: 2 });
    }

    #[tokio::test]
    async fn unregistered_event_reaches_only_catch_all() {
        let (registry, log) = registry(&[
            ("canvas_item_created", "created", Mode::Ok),
            (CATCH_ALL, "any", Mode::Ok),
        ]);

        registry.dispatch(&payload("canvas_snapshot_created")).await;

        assert_eq!(*log.lock().unwrap(), ["any"]);
    }

    #[tokio::test]
    async fn empty_registry_is_a_no_op() {
        let registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        let report = registry.dispatch(&payload("anything")).await;
        assert_eq!(report, DispatchReport::default());
    }

    #[test]
    fn panic_message_handles_both_string_kinds() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(&*s), "static");
        let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*s), "owned");
        let s: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(&*s), "non-string panic payload");
    }
}
