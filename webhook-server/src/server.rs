//! HTTP receiver for signed webhook deliveries.
//!
//! # Design
//! `WebhookServer` collects handlers, then freezes them behind an `Arc`
//! when turned into a `Router`. Each `POST /webhook` goes through:
//! signature check on the raw body bytes (401 on failure), payload parse
//! (400 on failure), dispatch to the registry, `200 {"status":"ok"}`.
//! Once dispatch has started the response is always 200; handler failures
//! are only logged.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use canvas_core::signature::SIGNATURE_HEADER;
use canvas_core::{verify_signature, Secret, WebhookPayload};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::Instrument;

use crate::config::WebhookConfig;
use crate::error::ServeError;
use crate::handler::WebhookHandler;
use crate::registry::HandlerRegistry;

pub const WEBHOOK_ID_HEADER: &str = "x-webhook-id";
pub const WEBHOOK_EVENT_HEADER: &str = "x-webhook-event";

struct AppState {
    secret: Secret,
    registry: HandlerRegistry,
}

pub struct WebhookServer {
    secret: Secret,
    registry: HandlerRegistry,
}

impl WebhookServer {
    pub fn new(secret: impl Into<Secret>) -> Self {
        Self {
            secret: secret.into(),
            registry: HandlerRegistry::new(),
        }
    }

    pub fn from_config(config: &WebhookConfig) -> Self {
        Self::new(config.secret.clone())
    }

    /// Register `handler` for `event`, or for every event with `"*"`.
    pub fn on(&mut self, event: impl Into<String>, handler: impl WebhookHandler + 'static) -> &mut Self {
        self.registry.register(event, handler);
        self
    }

    /// Replace the verification secret.
    pub fn set_secret(&mut self, secret: impl Into<Secret>) {
        self.secret = secret.into();
    }

    pub fn handler_count(&self) -> usize {
        self.registry.len()
    }

    pub fn into_router(self) -> Router {
        let state = Arc::new(AppState {
            secret: self.secret,
            registry: self.registry,
        });
        Router::new()
            .route("/webhook", post(receive_webhook))
            .route("/health", get(health))
            .with_state(state)
    }

    /// Serve on `listener` until `shutdown` resolves. In-flight requests
    /// finish before this returns.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, handlers = self.registry.len(), "webhook receiver listening");
        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("webhook receiver stopped");
        Ok(())
    }
}

fn error_response(status: StatusCode, message: &str, code: &str) -> Response {
    (status, Json(json!({ "error": { "message": message, "code": code } }))).into_response()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn receive_webhook(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    let span = tracing::info_span!(
        "webhook",
        id = header(&headers, WEBHOOK_ID_HEADER),
        event = header(&headers, WEBHOOK_EVENT_HEADER),
    );

    async move {
        let signature = header(&headers, SIGNATURE_HEADER).unwrap_or_default();
        if !verify_signature(&body, signature, state.secret.expose()) {
            tracing::warn!(has_signature = !signature.is_empty(), "rejected webhook signature");
            return error_response(StatusCode::UNAUTHORIZED, "Invalid signature", "INVALID_SIGNATURE");
        }

        let payload: WebhookPayload = match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "rejected webhook payload");
                return error_response(StatusCode::BAD_REQUEST, "Invalid payload", "INVALID_PAYLOAD");
            }
        };

        let report = state.registry.dispatch(&payload).await;
        tracing::debug!(
            event = %payload.event,
            invoked = report.invoked,
            failed = report.failed,
            "webhook dispatched"
        );
        Json(json!({ "status": "ok" })).into_response()
    }
    .instrument(span)
    .await
}
