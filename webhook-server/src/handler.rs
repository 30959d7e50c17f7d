//! Webhook handler trait and closure adapters.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use canvas_core::WebhookPayload;

/// Receives one verified, parsed webhook delivery.
///
/// Returning `Err` is logged by the dispatcher and does not stop the
/// remaining handlers.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn handle(&self, payload: &WebhookPayload) -> anyhow::Result<()>;
}

/// Handler built from an async closure. See [`handler_fn`].
pub struct FnHandler<F>(F);

/// Wrap an async closure. The closure receives its own copy of the payload.
///
/// ```rust,ignore
/// server.on("canvas_item_created", handler_fn(|payload| async move {
///     tracing::info!(id = ?payload.data.get("id"), "item created");
///     Ok(())
/// }));
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(WebhookPayload) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    FnHandler(f)
}

#[async_trait]
impl<F, Fut> WebhookHandler for FnHandler<F>
where
    F: Fn(WebhookPayload) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn handle(&self, payload: &WebhookPayload) -> anyhow::Result<()> {
        (self.0)(payload.clone()).await
    }
}

/// Handler built from a blocking closure. See [`sync_handler`].
pub struct SyncFnHandler<F>(Arc<F>);

/// Wrap a blocking closure. Each call runs on tokio's blocking pool, so
/// slow handlers do not stall other requests.
pub fn sync_handler<F>(f: F) -> SyncFnHandler<F>
where
    F: Fn(&WebhookPayload) -> anyhow::Result<()> + Send + Sync + 'static,
{
    SyncFnHandler(Arc::new(f))
}

#[async_trait]
impl<F> WebhookHandler for SyncFnHandler<F>
where
    F: Fn(&WebhookPayload) -> anyhow::Result<()> + Send + Sync + 'static,
{
    async fn handle(&self, payload: &WebhookPayload) -> anyhow::Result<()> {
        let f = Arc::clone(&self.0);
        let payload = payload.clone();
        // A panic inside the closure surfaces as a JoinError.
        tokio::task::spawn_blocking(move || f(&payload)).await?
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;

    use super::*;

    fn payload(event: &str) -> WebhookPayload {
        WebhookPayload {
            id: "evt-1".to_string(),
            event: event.to_string(),
            timestamp: Utc::now(),
            data: Default::default(),
        }
    }

    #[tokio::test]
    async fn async_closure_receives_payload() {
        let handler = handler_fn(|p: WebhookPayload| async move {
            anyhow::ensure!(p.event == "canvas_item_created", "wrong event {}", p.event);
            Ok(())
        });
        handler.handle(&payload("canvas_item_created")).await.unwrap();
        assert!(handler.handle(&payload("other")).await.is_err());
    }

    #[tokio::test]
    async fn blocking_closure_runs_off_the_runtime() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler = sync_handler(move |_| {
            std::thread::sleep(std::time::Duration::from_millis(5));
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        handler.handle(&payload("x")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blocking_panic_becomes_error() {
        let handler = sync_handler(|_| panic!("boom"));
        let err = handler.handle(&payload("x")).await.unwrap_err();
        assert!(err.to_string().contains("panic"), "{err}");
    }
}
