use canvas_core::{ApiError, InputError};
use thiserror::Error;

/// Failures that stop the receiver from serving.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("server I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("tunnel failed: {0:#}")]
    Tunnel(anyhow::Error),

    #[error("webhook registration failed: {0}")]
    Registration(#[from] ApiError),

    #[error("invalid webhook registration: {0}")]
    InvalidRegistration(#[from] InputError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
