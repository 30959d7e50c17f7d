//! Public tunnel plus automatic webhook registration for local development.
//!
//! # Design
//! `serve_with_tunnel` opens a `Tunnel` to the local port, registers a
//! webhook at `<public_url>/webhook` through a `BlockingClient`, serves
//! until shutdown, then deletes the webhook and closes the tunnel.
//! `WebhookRegistration` owns the created webhook and deletes it exactly
//! once: explicitly via [`WebhookRegistration::delete`], or from `Drop` if
//! the serving future is cancelled first. Deletion failures are logged,
//! never retried. Blocking client calls run on tokio's blocking pool.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use canvas_core::{
    BlockingClient, CreateWebhook, Description, InputError, Secret, Webhook, WebhookEvent,
    WebhookUrl,
};
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::error::ServeError;
use crate::server::WebhookServer;

/// Exposes a local port at a public URL.
#[async_trait]
pub trait Tunnel: Send {
    /// Start forwarding `port` and return the public base URL.
    async fn open(&mut self, port: u16, auth_token: &Secret) -> anyhow::Result<String>;

    async fn close(&mut self) -> anyhow::Result<()>;
}

/// A tunnel managed outside this process; `open` returns the given URL.
#[derive(Debug, Clone)]
pub struct StaticTunnel {
    public_url: String,
}

impl StaticTunnel {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into(),
        }
    }
}

#[async_trait]
impl Tunnel for StaticTunnel {
    async fn open(&mut self, port: u16, _auth_token: &Secret) -> anyhow::Result<String> {
        tracing::debug!(port, url = %self.public_url, "using externally managed tunnel");
        Ok(self.public_url.clone())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Which board and events to subscribe when auto-registering.
pub struct AutoRegister {
    pub client: Arc<BlockingClient>,
    pub board_id: Uuid,
    pub events: Vec<WebhookEvent>,
    /// Defaults to `canvas-rs webhook (tunnel: <public_url>)`, with the URL
    /// shortened to fit the description limit.
    pub description: Option<Description>,
}

/// A webhook created for this process, deleted exactly once.
pub struct WebhookRegistration {
    client: Arc<BlockingClient>,
    board_id: Uuid,
    webhook: Webhook,
    deleted: bool,
}

impl WebhookRegistration {
    pub async fn create(
        client: Arc<BlockingClient>,
        board_id: Uuid,
        input: CreateWebhook,
    ) -> Result<Self, ServeError> {
        let worker = Arc::clone(&client);
        let webhook =
            tokio::task::spawn_blocking(move || worker.create_webhook(board_id, &input)).await??;
        tracing::info!(webhook_id = %webhook.id, url = %webhook.url, "webhook registered");
        Ok(Self {
            client,
            board_id,
            webhook,
            deleted: false,
        })
    }

    pub fn webhook(&self) -> &Webhook {
        &self.webhook
    }

    /// Delete the webhook and wait for the result. Failure is logged.
    pub async fn delete(mut self) {
        self.deleted = true;
        let client = Arc::clone(&self.client);
        let (board_id, webhook_id) = (self.board_id, self.webhook.id.clone());
        let task = tokio::task::spawn_blocking({
            let webhook_id = webhook_id.clone();
            move || remove(&client, board_id, &webhook_id)
        });
        if let Err(err) = task.await {
            tracing::error!(%webhook_id, error = %err, "webhook cleanup task failed");
        }
    }
}

impl Drop for WebhookRegistration {
    fn drop(&mut self) {
        if self.deleted {
            return;
        }
        self.deleted = true;
        let client = Arc::clone(&self.client);
        let (board_id, webhook_id) = (self.board_id, self.webhook.id.clone());
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove(&client, board_id, &webhook_id));
            }
            Err(_) => remove(&client, board_id, &webhook_id),
        }
    }
}

fn remove(client: &BlockingClient, board_id: Uuid, webhook_id: &str) {
    match client.delete_webhook(board_id, webhook_id) {
        Ok(()) => tracing::info!(%webhook_id, "webhook deleted"),
        Err(err) => tracing::error!(%webhook_id, error = %err, "failed to delete webhook"),
    }
}

async fn close_tunnel<T: Tunnel>(tunnel: &mut T) {
    if let Err(err) = tunnel.close().await {
        tracing::error!(error = %err, "failed to close tunnel");
    }
}

/// Open `tunnel`, register a webhook pointing at it, and serve until
/// `shutdown` resolves.
///
/// The secret returned by the registration replaces the server's
/// configured secret, since deliveries for the new webhook are signed with
/// it.
pub async fn serve_with_tunnel<T, F>(
    mut server: WebhookServer,
    listener: TcpListener,
    tunnel: &mut T,
    auth_token: &Secret,
    register: AutoRegister,
    shutdown: F,
) -> Result<(), ServeError>
where
    T: Tunnel,
    F: Future<Output = ()> + Send + 'static,
{
    let port = listener.local_addr()?.port();
    let public_url = tunnel.open(port, auth_token).await.map_err(ServeError::Tunnel)?;
    let public_url = public_url.trim_end_matches('/').to_string();
    tracing::info!(port, %public_url, "tunnel open");

    let registration = match register_webhook(&public_url, register).await {
        Ok(registration) => registration,
        Err(err) => {
            close_tunnel(tunnel).await;
            return Err(err);
        }
    };
    if let Some(secret) = &registration.webhook().secret {
        server.set_secret(secret.clone());
    }

    let served = server.serve(listener, shutdown).await;

    registration.delete().await;
    close_tunnel(tunnel).await;
    served
}

async fn register_webhook(public_url: &str, register: AutoRegister) -> Result<WebhookRegistration, ServeError> {
    let url = WebhookUrl::new(format!("{public_url}/webhook"))?;
    let description = match register.description {
        Some(description) => description,
        None => default_description(public_url)?,
    };
    let input = CreateWebhook::new(url, register.events)?.with_description(description);
    WebhookRegistration::create(register.client, register.board_id, input).await
}

fn default_description(public_url: &str) -> Result<Description, InputError> {
    const PREFIX: &str = "canvas-rs webhook (tunnel: ";
    const SUFFIX: &str = ")";
    let room = Description::MAX_LEN - PREFIX.len() - SUFFIX.len();
    let url = match public_url.char_indices().nth(room) {
        Some((end, _)) => &public_url[..end],
        None => public_url,
    };
    Description::new(format!("{PREFIX}{url}{SUFFIX}"))
}
