//! Receiver for signed canvas webhook deliveries.
//!
//! # Overview
//! `WebhookServer` verifies `X-Webhook-Signature` on every `POST /webhook`,
//! parses the body into a `WebhookPayload` and dispatches it to registered
//! handlers. `serve_with_tunnel` adds a public tunnel and registers the
//! webhook with the canvas API for the lifetime of the process.
//!
//! ```rust,ignore
//! let mut server = WebhookServer::new("whsec_...");
//! server
//!     .on("canvas_item_created", handler_fn(|p| async move {
//!         tracing::info!(data = ?p.data, "created");
//!         Ok(())
//!     }))
//!     .on(CATCH_ALL, sync_handler(|p| {
//!         println!("{}", p.event);
//!         Ok(())
//!     }));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! server.serve(listener, shutdown_signal()).await?;
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod registry;
pub mod server;
pub mod tunnel;

pub use config::{TunnelConfig, WebhookConfig};
pub use error::ServeError;
pub use handler::{handler_fn, sync_handler, FnHandler, SyncFnHandler, WebhookHandler};
pub use registry::{DispatchReport, HandlerRegistry, CATCH_ALL};
pub use server::WebhookServer;
pub use tunnel::{serve_with_tunnel, AutoRegister, StaticTunnel, Tunnel, WebhookRegistration};

/// Resolves on Ctrl-C, or on SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
