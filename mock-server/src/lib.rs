use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// The only key the mock accepts in `X-API-Key`.
pub const API_KEY: &str = "dc_test_key";

const ITEM_TYPES: [&str; 6] = ["sticky", "text", "shape", "frame", "image", "document"];
const EVENTS: [&str; 4] = [
    "canvas_item_created",
    "canvas_item_updated",
    "canvas_item_deleted",
    "canvas_snapshot_created",
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Board {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub board_id: Uuid,
    #[serde(rename = "type")]
    pub item_type: String,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: f64,
    pub z_index: i64,
    pub content: Map<String, Value>,
    pub style: Map<String, Value>,
    pub frame_id: Option<Uuid>,
    pub locked: bool,
    pub version: u64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Webhook {
    pub id: Uuid,
    pub board_id: Uuid,
    pub url: String,
    pub events: Vec<String>,
    pub status: String,
    pub success_count: u64,
    pub failure_count: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Delivery {
    pub id: Uuid,
    pub webhook_id: Uuid,
    pub event_type: String,
    pub payload: Map<String, Value>,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub attempt: u32,
    pub duration_ms: Option<u64>,
    pub success: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory state. Vectors keep insertion order for stable listings.
#[derive(Default)]
pub struct Store {
    pub boards: Vec<Board>,
    pub items: Vec<Item>,
    pub webhooks: Vec<Webhook>,
    pub deliveries: Vec<Delivery>,
    pub documents: Vec<Document>,
}

pub type Db = Arc<RwLock<Store>>;

/// Error envelope response: `{"error": {"message", "code", "details"?}}`.
pub struct ApiFailure {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Value>,
}

impl ApiFailure {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{what} not found"))
    }

    fn validation(details: Map<String, Value>) -> Self {
        Self {
            details: Some(Value::Object(details)),
            ..Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Validation failed")
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let mut error = json!({ "message": self.message, "code": self.code });
        if let Some(details) = self.details {
            error["details"] = details;
        }
        (self.status, Json(json!({ "error": error }))).into_response()
    }
}

type ApiResult = Result<(StatusCode, Json<Value>), ApiFailure>;

fn ok<T: Serialize>(status: StatusCode, data: T) -> ApiResult {
    Ok((status, Json(json!({ "data": data }))))
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let api = Router::new()
        .route("/boards", get(list_boards).post(create_board))
        .route("/boards/{board_id}", get(get_board))
        .route("/boards/{board_id}/items", get(list_items).post(create_item))
        .route(
            "/boards/{board_id}/items/{item_id}",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route("/boards/{board_id}/items/{item_id}/position", patch(update_position))
        .route("/boards/{board_id}/items/{item_id}/content", patch(update_content))
        .route("/boards/{board_id}/items/{item_id}/lock", patch(update_lock))
        .route("/boards/{board_id}/webhooks", get(list_webhooks).post(create_webhook))
        .route(
            "/boards/{board_id}/webhooks/{webhook_id}",
            get(get_webhook).patch(update_webhook).delete(delete_webhook),
        )
        .route(
            "/boards/{board_id}/webhooks/{webhook_id}/deliveries",
            get(list_deliveries),
        )
        .route("/boards/{board_id}/webhooks/{webhook_id}/test", post(test_webhook))
        .route("/boards/{board_id}/webhooks/{webhook_id}/rotate", post(rotate_secret))
        .route("/boards/{board_id}/documents", get(list_documents).post(create_document))
        .route("/boards/{board_id}/documents/{document_id}", get(get_document))
        .layer(middleware::from_fn(require_api_key))
        .with_state(db);
    Router::new().nest("/v1", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_api_key(req: Request, next: Next) -> Response {
    match req.headers().get("x-api-key").and_then(|v| v.to_str().ok()) {
        Some(API_KEY) => next.run(req).await,
        _ => ApiFailure::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Invalid or missing API key",
        )
        .into_response(),
    }
}

fn require_board(store: &Store, board_id: Uuid) -> Result<(), ApiFailure> {
    if store.boards.iter().any(|b| b.id == board_id) {
        Ok(())
    } else {
        Err(ApiFailure::not_found("Board"))
    }
}

// --- boards ---

async fn list_boards(State(db): State<Db>) -> ApiResult {
    let store = db.read().await;
    ok(StatusCode::OK, &store.boards)
}

#[derive(Deserialize)]
struct CreateBoard {
    name: String,
    description: Option<String>,
}

async fn create_board(State(db): State<Db>, Json(input): Json<CreateBoard>) -> ApiResult {
    if input.name.trim().is_empty() {
        let mut details = Map::new();
        details.insert("name".into(), "must not be empty".into());
        return Err(ApiFailure::validation(details));
    }
    let now = Utc::now();
    let board = Board {
        id: Uuid::new_v4(),
        name: input.name,
        description: input.description,
        api_key: None,
        created_at: now,
        updated_at: now,
    };
    db.write().await.boards.push(board.clone());
    let created = Board {
        api_key: Some(API_KEY.to_string()),
        ..board
    };
    ok(StatusCode::CREATED, created)
}

async fn get_board(State(db): State<Db>, Path(board_id): Path<Uuid>) -> ApiResult {
    let store = db.read().await;
    let board = store
        .boards
        .iter()
        .find(|b| b.id == board_id)
        .ok_or_else(|| ApiFailure::not_found("Board"))?;
    ok(StatusCode::OK, board)
}

// --- items ---

#[derive(Deserialize)]
struct ItemFilter {
    #[serde(rename = "type")]
    item_type: Option<String>,
    frame_id: Option<Uuid>,
    locked: Option<bool>,
    limit: Option<usize>,
    cursor: Option<String>,
}

async fn list_items(
    State(db): State<Db>,
    Path(board_id): Path<Uuid>,
    Query(filter): Query<ItemFilter>,
) -> ApiResult {
    let store = db.read().await;
    require_board(&store, board_id)?;

    let limit = filter.limit.unwrap_or(50).clamp(1, 100);
    let offset: usize = filter.cursor.as_deref().and_then(|c| c.parse().ok()).unwrap_or(0);
    let matching: Vec<&Item> = store
        .items
        .iter()
        .filter(|i| i.board_id == board_id)
        .filter(|i| filter.item_type.as_deref().is_none_or(|t| i.item_type == t))
        .filter(|i| filter.frame_id.is_none_or(|f| i.frame_id == Some(f)))
        .filter(|i| filter.locked.is_none_or(|l| i.locked == l))
        .collect();
    let page: Vec<&Item> = matching.iter().skip(offset).take(limit).copied().collect();
    let next = offset + page.len();
    let next_cursor = (next < matching.len()).then(|| next.to_string());

    Ok((
        StatusCode::OK,
        Json(json!({
            "data": page,
            "meta": { "total": matching.len(), "next_cursor": next_cursor },
        })),
    ))
}

fn number_in(
    body: &Map<String, Value>,
    key: &str,
    min: f64,
    max: f64,
    details: &mut Map<String, Value>,
) -> Option<f64> {
    let value = body.get(key)?;
    match value.as_f64() {
        Some(n) if (min..=max).contains(&n) => Some(n),
        _ => {
            details.insert(key.into(), format!("must be a number between {min} and {max}").into());
            None
        }
    }
}

/// Apply the position/size fields shared by create, update and position.
fn apply_geometry(item: &mut Item, body: &Map<String, Value>, details: &mut Map<String, Value>) {
    if let Some(x) = number_in(body, "x", -1_000_000.0, 1_000_000.0, details) {
        item.x = x;
    }
    if let Some(y) = number_in(body, "y", -1_000_000.0, 1_000_000.0, details) {
        item.y = y;
    }
    if let Some(w) = number_in(body, "width", 1.0, 10_000.0, details) {
        item.width = Some(w);
    }
    if let Some(h) = number_in(body, "height", 1.0, 10_000.0, details) {
        item.height = Some(h);
    }
    if let Some(r) = number_in(body, "rotation", 0.0, 360.0, details) {
        item.rotation = r;
    }
}

async fn create_item(
    State(db): State<Db>,
    Path(board_id): Path<Uuid>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult {
    let mut store = db.write().await;
    require_board(&store, board_id)?;

    let mut details = Map::new();
    let item_type = body.get("type").and_then(Value::as_str).unwrap_or_default();
    if !ITEM_TYPES.contains(&item_type) {
        details.insert("type".into(), "unknown item type".into());
    }
    for key in ["x", "y"] {
        if !body.contains_key(key) {
            details.insert(key.into(), "required".into());
        }
    }
    let content = match body.get("content") {
        Some(Value::Object(map)) => map.clone(),
        _ => {
            details.insert("content".into(), "must be an object".into());
            Map::new()
        }
    };

    let now = Utc::now();
    let mut item = Item {
        id: Uuid::new_v4(),
        board_id,
        item_type: item_type.to_string(),
        x: 0.0,
        y: 0.0,
        width: None,
        height: None,
        rotation: 0.0,
        z_index: store.items.iter().filter(|i| i.board_id == board_id).count() as i64,
        content,
        style: body
            .get("style")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        frame_id: body
            .get("frame_id")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok()),
        locked: body.get("locked").and_then(Value::as_bool).unwrap_or(false),
        version: 1,
        created_by: "api-key".to_string(),
        created_at: now,
        updated_at: now,
    };
    apply_geometry(&mut item, &body, &mut details);
    if !details.is_empty() {
        return Err(ApiFailure::validation(details));
    }

    store.items.push(item.clone());
    ok(StatusCode::CREATED, item)
}

fn find_item(store: &mut Store, board_id: Uuid, item_id: Uuid) -> Result<&mut Item, ApiFailure> {
    store
        .items
        .iter_mut()
        .find(|i| i.board_id == board_id && i.id == item_id)
        .ok_or_else(|| ApiFailure::not_found("Item"))
}

async fn get_item(State(db): State<Db>, Path((board_id, item_id)): Path<(Uuid, Uuid)>) -> ApiResult {
    let mut store = db.write().await;
    let item = find_item(&mut store, board_id, item_id)?;
    ok(StatusCode::OK, &*item)
}

/// Validate `body` against a scratch copy, then commit and bump the version.
fn mutate_item(
    store: &mut Store,
    board_id: Uuid,
    item_id: Uuid,
    body: &Map<String, Value>,
) -> ApiResult {
    let item = find_item(store, board_id, item_id)?;
    let mut next = item.clone();
    let mut details = Map::new();

    apply_geometry(&mut next, body, &mut details);
    if let Some(content) = body.get("content") {
        match content.as_object() {
            Some(map) => next.content = map.clone(),
            None => {
                details.insert("content".into(), "must be an object".into());
            }
        }
    }
    if let Some(style) = body.get("style").and_then(Value::as_object) {
        next.style = style.clone();
    }
    if let Some(frame) = body.get("frame_id") {
        next.frame_id = frame.as_str().and_then(|s| s.parse().ok());
    }
    if let Some(locked) = body.get("locked").and_then(Value::as_bool) {
        next.locked = locked;
    }
    if !details.is_empty() {
        return Err(ApiFailure::validation(details));
    }

    next.version += 1;
    next.updated_at = Utc::now();
    *item = next.clone();
    ok(StatusCode::OK, next)
}

async fn update_item(
    State(db): State<Db>,
    Path((board_id, item_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult {
    mutate_item(&mut *db.write().await, board_id, item_id, &body)
}

async fn update_position(
    State(db): State<Db>,
    Path((board_id, item_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult {
    if !(body.contains_key("x") && body.contains_key("y")) {
        let mut details = Map::new();
        details.insert("position".into(), "x and y are required".into());
        return Err(ApiFailure::validation(details));
    }
    let geometry: Map<String, Value> = body
        .into_iter()
        .filter(|(k, _)| matches!(k.as_str(), "x" | "y" | "width" | "height" | "rotation"))
        .collect();
    mutate_item(&mut *db.write().await, board_id, item_id, &geometry)
}

async fn update_content(
    State(db): State<Db>,
    Path((board_id, item_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult {
    let mut only = Map::new();
    only.insert("content".into(), body.get("content").cloned().unwrap_or(Value::Null));
    mutate_item(&mut *db.write().await, board_id, item_id, &only)
}

#[derive(Deserialize)]
struct LockInput {
    locked: bool,
}

async fn update_lock(
    State(db): State<Db>,
    Path((board_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<LockInput>,
) -> ApiResult {
    let mut only = Map::new();
    only.insert("locked".into(), input.locked.into());
    mutate_item(&mut *db.write().await, board_id, item_id, &only)
}

async fn delete_item(
    State(db): State<Db>,
    Path((board_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiFailure> {
    let mut store = db.write().await;
    let before = store.items.len();
    store.items.retain(|i| !(i.board_id == board_id && i.id == item_id));
    if store.items.len() == before {
        return Err(ApiFailure::not_found("Item"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- webhooks ---

fn new_secret() -> String {
    format!("whsec_{}", Uuid::new_v4().simple())
}

fn validate_events(events: &[String], details: &mut Map<String, Value>) {
    if events.is_empty() {
        details.insert("events".into(), "at least one event is required".into());
    } else if events.iter().any(|e| !EVENTS.contains(&e.as_str())) {
        details.insert("events".into(), "unknown event".into());
    }
}

async fn list_webhooks(State(db): State<Db>, Path(board_id): Path<Uuid>) -> ApiResult {
    let store = db.read().await;
    require_board(&store, board_id)?;
    let hooks: Vec<&Webhook> = store.webhooks.iter().filter(|w| w.board_id == board_id).collect();
    ok(StatusCode::OK, hooks)
}

#[derive(Deserialize)]
struct CreateWebhook {
    url: String,
    events: Vec<String>,
    description: Option<String>,
}

async fn create_webhook(
    State(db): State<Db>,
    Path(board_id): Path<Uuid>,
    Json(input): Json<CreateWebhook>,
) -> ApiResult {
    let mut store = db.write().await;
    require_board(&store, board_id)?;

    let mut details = Map::new();
    if input.url.is_empty() || input.url.len() > 2000 {
        details.insert("url".into(), "must be 1-2000 characters".into());
    }
    validate_events(&input.events, &mut details);
    if !details.is_empty() {
        return Err(ApiFailure::validation(details));
    }

    let now = Utc::now();
    let webhook = Webhook {
        id: Uuid::new_v4(),
        board_id,
        url: input.url,
        events: input.events,
        status: "active".to_string(),
        success_count: 0,
        failure_count: 0,
        last_success: None,
        last_failure: None,
        last_error: None,
        description: input.description,
        secret: None,
        created_by: "api-key".to_string(),
        created_at: now,
        updated_at: now,
    };
    store.webhooks.push(webhook.clone());
    let created = Webhook {
        secret: Some(new_secret()),
        ..webhook
    };
    ok(StatusCode::CREATED, created)
}

fn find_webhook(store: &mut Store, board_id: Uuid, webhook_id: Uuid) -> Result<&mut Webhook, ApiFailure> {
    store
        .webhooks
        .iter_mut()
        .find(|w| w.board_id == board_id && w.id == webhook_id)
        .ok_or_else(|| ApiFailure::not_found("Webhook"))
}

async fn get_webhook(
    State(db): State<Db>,
    Path((board_id, webhook_id)): Path<(Uuid, Uuid)>,
) -> ApiResult {
    let mut store = db.write().await;
    let webhook = find_webhook(&mut store, board_id, webhook_id)?;
    ok(StatusCode::OK, &*webhook)
}

#[derive(Deserialize)]
struct UpdateWebhook {
    url: Option<String>,
    events: Option<Vec<String>>,
    description: Option<String>,
    status: Option<String>,
}

async fn update_webhook(
    State(db): State<Db>,
    Path((board_id, webhook_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateWebhook>,
) -> ApiResult {
    let mut store = db.write().await;
    let webhook = find_webhook(&mut store, board_id, webhook_id)?;

    let mut details = Map::new();
    if let Some(events) = &input.events {
        validate_events(events, &mut details);
    }
    if let Some(status) = &input.status {
        if !matches!(status.as_str(), "active" | "paused" | "disabled") {
            details.insert("status".into(), "unknown status".into());
        }
    }
    if !details.is_empty() {
        return Err(ApiFailure::validation(details));
    }

    if let Some(url) = input.url {
        webhook.url = url;
    }
    if let Some(events) = input.events {
        webhook.events = events;
    }
    if let Some(description) = input.description {
        webhook.description = Some(description);
    }
    if let Some(status) = input.status {
        webhook.status = status;
    }
    webhook.updated_at = Utc::now();
    ok(StatusCode::OK, &*webhook)
}

async fn delete_webhook(
    State(db): State<Db>,
    Path((board_id, webhook_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiFailure> {
    let mut store = db.write().await;
    let before = store.webhooks.len();
    store
        .webhooks
        .retain(|w| !(w.board_id == board_id && w.id == webhook_id));
    if store.webhooks.len() == before {
        return Err(ApiFailure::not_found("Webhook"));
    }
    store.deliveries.retain(|d| d.webhook_id != webhook_id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct PageParams {
    limit: Option<usize>,
    cursor: Option<String>,
}

async fn list_deliveries(
    State(db): State<Db>,
    Path((board_id, webhook_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<PageParams>,
) -> ApiResult {
    let mut store = db.write().await;
    find_webhook(&mut store, board_id, webhook_id)?;
    let limit = params.limit.unwrap_or(50).clamp(1, 100);
    let offset: usize = params.cursor.as_deref().and_then(|c| c.parse().ok()).unwrap_or(0);
    let page: Vec<&Delivery> = store
        .deliveries
        .iter()
        .filter(|d| d.webhook_id == webhook_id)
        .skip(offset)
        .take(limit)
        .collect();
    ok(StatusCode::OK, page)
}

/// Records a successful synthetic delivery; nothing is sent over the wire.
async fn test_webhook(
    State(db): State<Db>,
    Path((board_id, webhook_id)): Path<(Uuid, Uuid)>,
) -> ApiResult {
    let mut store = db.write().await;
    let webhook = find_webhook(&mut store, board_id, webhook_id)?;
    let now = Utc::now();
    webhook.success_count += 1;
    webhook.last_success = Some(now);

    let mut payload = Map::new();
    payload.insert("test".into(), true.into());
    store.deliveries.push(Delivery {
        id: Uuid::new_v4(),
        webhook_id,
        event_type: "test".to_string(),
        payload,
        status_code: Some(200),
        error: None,
        attempt: 1,
        duration_ms: Some(0),
        success: true,
        created_at: now,
    });
    ok(StatusCode::OK, json!({ "message": "Test event sent" }))
}

async fn rotate_secret(
    State(db): State<Db>,
    Path((board_id, webhook_id)): Path<(Uuid, Uuid)>,
) -> ApiResult {
    let mut store = db.write().await;
    let webhook = find_webhook(&mut store, board_id, webhook_id)?;
    webhook.updated_at = Utc::now();
    ok(StatusCode::OK, json!({ "secret": new_secret() }))
}

// --- documents ---

async fn list_documents(State(db): State<Db>, Path(board_id): Path<Uuid>) -> ApiResult {
    let store = db.read().await;
    require_board(&store, board_id)?;
    let docs: Vec<Value> = store
        .documents
        .iter()
        .filter(|d| d.board_id == board_id)
        .map(|d| {
            json!({
                "id": d.id,
                "title": d.title,
                "author": d.author,
                "created_at": d.created_at,
                "preview": d.content.chars().take(150).collect::<String>(),
            })
        })
        .collect();
    ok(StatusCode::OK, docs)
}

#[derive(Deserialize)]
struct CreateDocument {
    title: String,
    content: String,
    author: String,
}

async fn create_document(
    State(db): State<Db>,
    Path(board_id): Path<Uuid>,
    Json(input): Json<CreateDocument>,
) -> ApiResult {
    let mut store = db.write().await;
    require_board(&store, board_id)?;

    let mut details = Map::new();
    if input.title.is_empty() || input.title.chars().count() > 255 {
        details.insert("title".into(), "must be 1-255 characters".into());
    }
    if input.author.is_empty() || input.author.chars().count() > 100 {
        details.insert("author".into(), "must be 1-100 characters".into());
    }
    if !details.is_empty() {
        return Err(ApiFailure::validation(details));
    }

    let now = Utc::now();
    let doc = Document {
        id: Uuid::new_v4(),
        board_id,
        title: input.title,
        content: input.content,
        author: input.author,
        created_at: now,
        updated_at: now,
    };
    store.documents.push(doc.clone());
    ok(
        StatusCode::CREATED,
        json!({
            "id": doc.id,
            "board_id": doc.board_id,
            "title": doc.title,
            "author": doc.author,
            "created_at": doc.created_at,
        }),
    )
}

async fn get_document(
    State(db): State<Db>,
    Path((board_id, document_id)): Path<(Uuid, Uuid)>,
) -> ApiResult {
    let store = db.read().await;
    let doc = store
        .documents
        .iter()
        .find(|d| d.board_id == board_id && d.id == document_id)
        .ok_or_else(|| ApiFailure::not_found("Document"))?;
    ok(StatusCode::OK, doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_omits_api_key_unless_set() {
        let board = Board {
            id: Uuid::nil(),
            name: "Test".to_string(),
            description: None,
            api_key: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert!(json.get("api_key").is_none());
    }

    #[test]
    fn failure_renders_error_envelope() {
        let mut details = Map::new();
        details.insert("x".into(), "required".into());
        let resp = ApiFailure::validation(details).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn geometry_out_of_range_is_reported() {
        let mut item = Item {
            id: Uuid::nil(),
            board_id: Uuid::nil(),
            item_type: "sticky".to_string(),
            x: 0.0,
            y: 0.0,
            width: None,
            height: None,
            rotation: 0.0,
            z_index: 0,
            content: Map::new(),
            style: Map::new(),
            frame_id: None,
            locked: false,
            version: 1,
            created_by: "t".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let body: Map<String, Value> =
            serde_json::from_str(r#"{"x": 5, "rotation": 400}"#).unwrap();
        let mut details = Map::new();
        apply_geometry(&mut item, &body, &mut details);
        assert_eq!(item.x, 5.0);
        assert_eq!(item.rotation, 0.0);
        assert!(details.contains_key("rotation"));
    }
}
