//! Synchronous client core for the canvas board API.
//!
//! # Overview
//! `CanvasClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. `BlockingClient` pairs it with a
//! `Transport` (ureq by default) for one-call-per-operation use.
//! `signature` verifies inbound webhook signatures.
//!
//! # Design
//! - `CanvasClient` is stateless: endpoint root plus API key.
//! - Each operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit and error classification is testable offline.
//! - Input constraints live in the `fields` newtypes; the client trusts
//!   them and passes values through.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod fields;
pub mod http;
pub mod signature;
pub mod transport;
pub mod types;

pub use client::CanvasClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use fields::{
    AuthorName, Coordinate, Description, Dimension, DocumentTitle, InputError, Limit, Rotation,
    Secret, WebhookUrl,
};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use signature::{sign, verify_signature};
pub use transport::{BlockingClient, Transport, UreqTransport};
pub use types::{
    Board, CanvasItem, CreateBoard, CreateDocument, CreateItem, CreateWebhook, Document,
    DocumentSummary, ItemPatch, ItemType, JsonMap, ListItemsQuery, Page, PageQuery,
    PositionUpdate, Webhook, WebhookDelivery, WebhookEvent, WebhookPatch, WebhookPayload,
    WebhookStatus,
};
