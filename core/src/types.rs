//! Domain DTOs for the canvas API.
//!
//! # Design
//! Entities (`Board`, `CanvasItem`, `Webhook`, ...) mirror the server's JSON
//! and are only ever received. Request types (`Create*`, `*Patch`) are only
//! ever sent; their constrained fields use the validated newtypes from
//! [`crate::fields`]. Patch types skip `None` fields when serializing so an
//! omitted field is never sent as `null` or a default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::fields::{
    AuthorName, Coordinate, Description, Dimension, DocumentTitle, InputError, Limit, Rotation,
    Secret, WebhookUrl,
};

/// Free-form JSON object used for item content, style and event data.
pub type JsonMap = Map<String, Value>;

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// `{"data": ..., "meta": {...}}` success wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Option<JsonMap>,
}

/// One page of a list call, with the response metadata kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: Option<JsonMap>,
}

impl<T> Page<T> {
    /// Cursor for the next page, if the server reported one.
    pub fn next_cursor(&self) -> Option<&str> {
        let meta = self.meta.as_ref()?;
        meta.get("next_cursor")
            .or_else(|| meta.get("cursor"))
            .and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// Boards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Only populated in the response to `create_board`.
    #[serde(default)]
    pub api_key: Option<Secret>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateBoard {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
}

impl CreateBoard {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Canvas items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Sticky,
    Text,
    Shape,
    Frame,
    Image,
    Document,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Sticky => "sticky",
            ItemType::Text => "text",
            ItemType::Shape => "shape",
            ItemType::Frame => "frame",
            ItemType::Image => "image",
            ItemType::Document => "document",
        }
    }
}

fn default_version() -> u64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasItem {
    pub id: String,
    pub board_id: Uuid,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub z_index: i64,
    pub content: JsonMap,
    #[serde(default)]
    pub style: JsonMap,
    #[serde(default)]
    pub frame_id: Option<String>,
    #[serde(default)]
    pub locked: bool,
    /// Bumped by the server on every successful mutation.
    #[serde(default = "default_version")]
    pub version: u64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateItem {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub x: Coordinate,
    pub y: Coordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Dimension>,
    pub rotation: Rotation,
    pub content: JsonMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<JsonMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    pub locked: bool,
}

impl CreateItem {
    pub fn new(item_type: ItemType, x: Coordinate, y: Coordinate, content: JsonMap) -> Self {
        Self {
            item_type,
            x,
            y,
            width: None,
            height: None,
            rotation: Rotation::default(),
            content,
            style: None,
            frame_id: None,
            locked: false,
        }
    }
}

/// Partial update for an item. Only `Some` fields are sent.
///
/// `frame_id` is doubly optional: `None` leaves the frame unchanged,
/// `Some(None)` detaches the item from its frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<JsonMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<JsonMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.rotation.is_none()
            && self.content.is_none()
            && self.style.is_none()
            && self.frame_id.is_none()
            && self.locked.is_none()
    }
}

/// Body of `PATCH .../position`.
#[derive(Debug, Clone, Serialize)]
pub struct PositionUpdate {
    pub x: Coordinate,
    pub y: Coordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
}

impl PositionUpdate {
    pub fn new(x: Coordinate, y: Coordinate) -> Self {
        Self {
            x,
            y,
            width: None,
            height: None,
            rotation: None,
        }
    }
}

/// Filters and paging for `list_items`.
#[derive(Debug, Clone, Default)]
pub struct ListItemsQuery {
    pub item_type: Option<ItemType>,
    pub frame_id: Option<String>,
    pub locked: Option<bool>,
    pub limit: Limit,
    pub cursor: Option<String>,
}

impl ListItemsQuery {
    pub(crate) fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("limit".to_string(), self.limit.get().to_string())];
        if let Some(item_type) = self.item_type {
            pairs.push(("type".to_string(), item_type.as_str().to_string()));
        }
        if let Some(frame_id) = &self.frame_id {
            pairs.push(("frame_id".to_string(), frame_id.clone()));
        }
        if let Some(locked) = self.locked {
            pairs.push(("locked".to_string(), locked.to_string()));
        }
        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor".to_string(), cursor.clone()));
        }
        pairs
    }
}

/// Paging for list calls without filters.
#[derive(Debug, Clone, Default)]
pub struct PageQuery {
    pub limit: Limit,
    pub cursor: Option<String>,
}

impl PageQuery {
    pub(crate) fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("limit".to_string(), self.limit.get().to_string())];
        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor".to_string(), cursor.clone()));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Webhooks
// ---------------------------------------------------------------------------

/// Event kinds a webhook can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEvent {
    CanvasItemCreated,
    CanvasItemUpdated,
    CanvasItemDeleted,
    CanvasSnapshotCreated,
    /// A kind this client version does not know about.
    #[serde(other)]
    Unknown,
}

impl WebhookEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookEvent::CanvasItemCreated => "canvas_item_created",
            WebhookEvent::CanvasItemUpdated => "canvas_item_updated",
            WebhookEvent::CanvasItemDeleted => "canvas_item_deleted",
            WebhookEvent::CanvasSnapshotCreated => "canvas_snapshot_created",
            WebhookEvent::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Active,
    Paused,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub board_id: Uuid,
    pub url: String,
    pub events: Vec<WebhookEvent>,
    pub status: WebhookStatus,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub failure_count: u64,
    #[serde(default)]
    pub last_success: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_failure: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Only returned on creation and secret rotation.
    #[serde(default)]
    pub secret: Option<Secret>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateWebhook {
    pub url: WebhookUrl,
    events: Vec<WebhookEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
}

impl CreateWebhook {
    /// Fails if `events` is empty.
    pub fn new(url: WebhookUrl, events: Vec<WebhookEvent>) -> Result<Self, InputError> {
        if events.is_empty() {
            return Err(InputError::Empty { field: "events" });
        }
        Ok(Self {
            url,
            events,
            description: None,
        })
    }

    pub fn with_description(mut self, description: Description) -> Self {
        self.description = Some(description);
        self
    }

    pub fn events(&self) -> &[WebhookEvent] {
        &self.events
    }
}

/// Partial update for a webhook. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebhookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<WebhookUrl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<WebhookEvent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WebhookStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub id: String,
    pub webhook_id: String,
    pub event_type: String,
    pub payload: JsonMap,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    pub attempt: u32,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    pub success: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of an inbound webhook notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub id: String,
    pub event: String,
    pub timestamp: DateTime<Utc>,
    pub data: JsonMap,
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub board_id: Uuid,
    pub title: String,
    /// Absent in the response to `create_document`.
    #[serde(default)]
    pub content: Option<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Listing entry; `preview` holds the first characters of the content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub preview: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDocument {
    pub title: DocumentTitle,
    pub content: String,
    pub author: AuthorName,
}

impl CreateDocument {
    pub fn new(title: DocumentTitle, content: impl Into<String>) -> Self {
        Self {
            title,
            content: content.into(),
            author: AuthorName::default(),
        }
    }
}
