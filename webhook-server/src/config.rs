//! Receiver settings read from the environment.

use std::env;
use std::net::SocketAddr;

use canvas_core::{ConfigError, Secret};
use uuid::Uuid;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct TunnelConfig {
    pub auth_token: Secret,
    /// Public URL of an externally managed tunnel.
    pub public_url: Option<String>,
    /// Board the webhook is registered on.
    pub board_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Shared secret used to verify `X-Webhook-Signature`.
    pub secret: Secret,
    pub bind_addr: SocketAddr,
    /// `Some` when tunnel mode is enabled.
    pub tunnel: Option<TunnelConfig>,
}

impl WebhookConfig {
    pub fn new(secret: impl Into<Secret>) -> Self {
        Self {
            secret: secret.into(),
            bind_addr: ([0, 0, 0, 0], 8000).into(),
            tunnel: None,
        }
    }

    /// Read `CANVAS_WEBHOOK_SECRET` (required), `CANVAS_WEBHOOK_ADDR`,
    /// `CANVAS_TUNNEL_ENABLED`, `CANVAS_TUNNEL_AUTH_TOKEN` (required when
    /// the tunnel is enabled), `CANVAS_TUNNEL_URL` and `CANVAS_BOARD_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = lookup("CANVAS_WEBHOOK_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("CANVAS_WEBHOOK_SECRET"))?;
        let mut config = Self::new(secret);

        if let Some(raw) = lookup("CANVAS_WEBHOOK_ADDR") {
            config.bind_addr = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "CANVAS_WEBHOOK_ADDR",
                value: raw.clone(),
            })?;
        }

        let enabled = match lookup("CANVAS_TUNNEL_ENABLED").as_deref().map(str::trim) {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "CANVAS_TUNNEL_ENABLED",
                    value: other.to_string(),
                })
            }
        };
        if enabled {
            let auth_token = lookup("CANVAS_TUNNEL_AUTH_TOKEN")
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing("CANVAS_TUNNEL_AUTH_TOKEN"))?;
            let board_id = match lookup("CANVAS_BOARD_ID") {
                Some(raw) => Some(raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    name: "CANVAS_BOARD_ID",
                    value: raw.clone(),
                })?),
                None => None,
            };
            config.tunnel = Some(TunnelConfig {
                auth_token: auth_token.into(),
                public_url: lookup("CANVAS_TUNNEL_URL").filter(|v| !v.is_empty()),
                board_id,
            });
        }
        Ok(config)
    }
}
