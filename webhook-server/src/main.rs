use std::sync::Arc;

use anyhow::Context;
use canvas_core::{BlockingClient, ClientConfig, WebhookEvent, WebhookPayload};
use canvas_webhooks::{
    serve_with_tunnel, shutdown_signal, sync_handler, AutoRegister, StaticTunnel, WebhookConfig,
    WebhookServer, CATCH_ALL,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn log_delivery(payload: &WebhookPayload) -> anyhow::Result<()> {
    tracing::info!(
        id = %payload.id,
        event = %payload.event,
        timestamp = %payload.timestamp,
        data = %serde_json::Value::Object(payload.data.clone()),
        "webhook received"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WebhookConfig::from_env().context("loading webhook configuration")?;
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    let mut server = WebhookServer::from_config(&config);
    server.on(CATCH_ALL, sync_handler(log_delivery));

    let Some(tunnel_config) = config.tunnel else {
        server.serve(listener, shutdown_signal()).await?;
        return Ok(());
    };

    let public_url = tunnel_config
        .public_url
        .context("CANVAS_TUNNEL_URL is required in tunnel mode")?;
    let board_id = tunnel_config
        .board_id
        .context("CANVAS_BOARD_ID is required in tunnel mode")?;
    let client_config = ClientConfig::from_env().context("loading API client configuration")?;

    let register = AutoRegister {
        client: Arc::new(BlockingClient::new(&client_config)),
        board_id,
        events: vec![
            WebhookEvent::CanvasItemCreated,
            WebhookEvent::CanvasItemUpdated,
            WebhookEvent::CanvasItemDeleted,
            WebhookEvent::CanvasSnapshotCreated,
        ],
        description: None,
    };
    let mut tunnel = StaticTunnel::new(public_url);
    serve_with_tunnel(
        server,
        listener,
        &mut tunnel,
        &tunnel_config.auth_token,
        register,
        shutdown_signal(),
    )
    .await?;
    Ok(())
}
