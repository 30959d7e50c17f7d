//! Error types for the canvas API client.
//!
//! # Design
//! Every non-2xx response is classified into exactly one API variant by
//! status code: 401 `Authentication`, 404 `NotFound`, 400 `Validation`,
//! 429 `RateLimit`, 5xx `Server`, anything else `Http`. Message and code
//! come from the `{"error": {"message", "code"}}` envelope when the body
//! parses, otherwise from the raw text.
//!
//! Transport failures (`Timeout`, `Network`) and local failures
//! (`InvalidInput`, (de)serialization) are separate variants so callers can
//! tell "the server said no" from "we never got an answer".

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::fields::InputError;
use crate::http::HttpResponse;

/// Errors returned by `CanvasClient` parse methods and `BlockingClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: the API key is missing, invalid, or not allowed on this board.
    #[error("[UNAUTHORIZED] {message}")]
    Authentication { message: String },

    /// 404: the requested resource does not exist.
    #[error("[NOT_FOUND] {message}")]
    NotFound { message: String },

    /// 400: the server rejected the request payload.
    #[error("[VALIDATION_ERROR] {message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    /// 429: too many requests. `retry_after` is taken from the
    /// `Retry-After` header when it holds a number of seconds.
    #[error("[RATE_LIMIT] {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// 5xx.
    #[error("[SERVER_ERROR] {message}")]
    Server { message: String, status: u16 },

    /// Any other non-success status.
    #[error("[{code}] {message}")]
    Http {
        message: String,
        code: String,
        status: u16,
    },

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, DNS, TLS or I/O failure before a response was read.
    #[error("network error: {0}")]
    Network(String),

    /// An entity was expected but the server answered with no body.
    #[error("expected a response body, got HTTP {status} with none")]
    EmptyBody { status: u16 },

    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// HTTP status carried by the API variants.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Authentication { .. } => Some(401),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Validation { .. } => Some(400),
            ApiError::RateLimit { .. } => Some(429),
            ApiError::Server { status, .. } | ApiError::Http { status, .. } => Some(*status),
            ApiError::EmptyBody { status } => Some(*status),
            _ => None,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Authentication { .. } => Some("UNAUTHORIZED"),
            ApiError::NotFound { .. } => Some("NOT_FOUND"),
            ApiError::Validation { .. } => Some("VALIDATION_ERROR"),
            ApiError::RateLimit { .. } => Some("RATE_LIMIT"),
            ApiError::Server { .. } => Some("SERVER_ERROR"),
            ApiError::Http { code, .. } => Some(code),
            _ => None,
        }
    }

    /// True for failures where no HTTP response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Timeout(_) | ApiError::Network(_))
    }

    /// Classify a non-success response. Callers must have already handled
    /// 2xx statuses.
    pub fn from_response(response: &HttpResponse) -> Self {
        let status = response.status;
        let parsed = ErrorBody::parse(status, &response.body);

        match status {
            401 => ApiError::Authentication { message: parsed.message },
            404 => ApiError::NotFound { message: parsed.message },
            400 => ApiError::Validation {
                message: parsed.message,
                details: parsed.details,
            },
            429 => ApiError::RateLimit {
                message: parsed.message,
                retry_after: response
                    .header("retry-after")
                    .and_then(|v| v.trim().parse().ok()),
            },
            s if s >= 500 => ApiError::Server {
                message: parsed.message,
                status: s,
            },
            s => ApiError::Http {
                message: parsed.message,
                code: parsed.code,
                status: s,
            },
        }
    }
}

/// Message, code and details extracted from an error response body.
struct ErrorBody {
    message: String,
    code: String,
    details: Option<Value>,
}

impl ErrorBody {
    fn parse(status: u16, body: &str) -> Self {
        let Ok(json) = serde_json::from_str::<Value>(body) else {
            return Self {
                message: format!("HTTP {status}: {body}"),
                code: "HTTP_ERROR".to_string(),
                details: None,
            };
        };

        let error = json.get("error");
        let message = match error {
            Some(Value::String(s)) => Some(s.clone()),
            Some(obj) => obj.get("message").and_then(Value::as_str).map(str::to_string),
            None => None,
        };
        let code = error
            .and_then(|e| e.get("code"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let details = error
            .and_then(|e| e.get("details"))
            .or_else(|| json.get("details"))
            .filter(|d| !d.is_null())
            .cloned();

        Self {
            message: message.unwrap_or_else(|| "Unknown error".to_string()),
            code: code.unwrap_or_else(|| "UNKNOWN".to_string()),
            details,
        }
    }
}
