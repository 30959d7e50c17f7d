//! Stateless HTTP request builder and response parser for the canvas API.
//!
//! # Design
//! `CanvasClient` holds only the endpoint root and the API key and carries
//! no mutable state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. `BlockingClient` runs the round-trip in
//! between; tests can feed canned responses straight into `parse_*`.
//!
//! Every success body is an envelope `{"data": ..., "meta": ...}`. Entity
//! calls unwrap `data`; list calls decode `data` element-wise and drop
//! `meta` unless a `*_page` variant is used. A 204 is success with no body
//! and is never handed to the JSON parser.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::fields::Secret;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    Board, CanvasItem, CreateBoard, CreateDocument, CreateItem, CreateWebhook, Document,
    DocumentSummary, Envelope, ItemPatch, JsonMap, ListItemsQuery, Page, PageQuery,
    PositionUpdate, Webhook, WebhookDelivery, WebhookPatch,
};

const USER_AGENT: &str = concat!("canvas-rs/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Synchronous, stateless client for the canvas API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct CanvasClient {
    /// `base_url` + `api_prefix`, without a trailing slash.
    root: String,
    api_key: Secret,
}

impl CanvasClient {
    pub fn new(config: &ClientConfig) -> Self {
        let base = config.base_url.trim_end_matches('/');
        let prefix = config.api_prefix.trim_matches('/');
        let root = if prefix.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{prefix}")
        };
        Self {
            root,
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}", self.root),
            query: Vec::new(),
            headers: vec![
                (API_KEY_HEADER.to_string(), self.api_key.expose().to_string()),
                ("Accept".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
            ],
            body: None,
        }
    }

    fn json_request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut req = self.request(method, path);
        req.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        req.body = Some(body);
        Ok(req)
    }

    // -----------------------------------------------------------------------
    // Boards
    // -----------------------------------------------------------------------

    pub fn build_list_boards(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/boards")
    }

    pub fn build_get_board(&self, board_id: Uuid) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/boards/{board_id}"))
    }

    pub fn build_create_board(&self, input: &CreateBoard) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/boards", input)
    }

    pub fn parse_list_boards(&self, response: HttpResponse) -> Result<Vec<Board>, ApiError> {
        parse_list(response)
    }

    pub fn parse_get_board(&self, response: HttpResponse) -> Result<Board, ApiError> {
        parse_data(response)
    }

    pub fn parse_create_board(&self, response: HttpResponse) -> Result<Board, ApiError> {
        parse_data(response)
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    pub fn build_list_items(&self, board_id: Uuid, query: &ListItemsQuery) -> HttpRequest {
        let mut req = self.request(HttpMethod::Get, &format!("/boards/{board_id}/items"));
        req.query = query.to_pairs();
        req
    }

    pub fn build_get_item(&self, board_id: Uuid, item_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/boards/{board_id}/items/{item_id}"))
    }

    pub fn build_create_item(&self, board_id: Uuid, input: &CreateItem) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, &format!("/boards/{board_id}/items"), input)
    }

    pub fn build_update_item(
        &self,
        board_id: Uuid,
        item_id: &str,
        patch: &ItemPatch,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Patch,
            &format!("/boards/{board_id}/items/{item_id}"),
            patch,
        )
    }

    pub fn build_delete_item(&self, board_id: Uuid, item_id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/boards/{board_id}/items/{item_id}"))
    }

    pub fn build_update_item_position(
        &self,
        board_id: Uuid,
        item_id: &str,
        position: &PositionUpdate,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Patch,
            &format!("/boards/{board_id}/items/{item_id}/position"),
            position,
        )
    }

    pub fn build_update_item_content(
        &self,
        board_id: Uuid,
        item_id: &str,
        content: &JsonMap,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Patch,
            &format!("/boards/{board_id}/items/{item_id}/content"),
            &json!({ "content": content }),
        )
    }

    pub fn build_set_item_lock(
        &self,
        board_id: Uuid,
        item_id: &str,
        locked: bool,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Patch,
            &format!("/boards/{board_id}/items/{item_id}/lock"),
            &json!({ "locked": locked }),
        )
    }

    pub fn parse_list_items(&self, response: HttpResponse) -> Result<Vec<CanvasItem>, ApiError> {
        parse_list(response)
    }

    pub fn parse_list_items_page(&self, response: HttpResponse) -> Result<Page<CanvasItem>, ApiError> {
        parse_page(response)
    }

    /// Shared by get, create, update and the narrow `PATCH` variants.
    pub fn parse_item(&self, response: HttpResponse) -> Result<CanvasItem, ApiError> {
        parse_data(response)
    }

    pub fn parse_delete_item(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_empty(response)
    }

    // -----------------------------------------------------------------------
    // Webhooks
    // -----------------------------------------------------------------------

    pub fn build_list_webhooks(&self, board_id: Uuid) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/boards/{board_id}/webhooks"))
    }

    pub fn build_get_webhook(&self, board_id: Uuid, webhook_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/boards/{board_id}/webhooks/{webhook_id}"),
        )
    }

    pub fn build_create_webhook(
        &self,
        board_id: Uuid,
        input: &CreateWebhook,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, &format!("/boards/{board_id}/webhooks"), input)
    }

    pub fn build_update_webhook(
        &self,
        board_id: Uuid,
        webhook_id: &str,
        patch: &WebhookPatch,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Patch,
            &format!("/boards/{board_id}/webhooks/{webhook_id}"),
            patch,
        )
    }

    pub fn build_delete_webhook(&self, board_id: Uuid, webhook_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Delete,
            &format!("/boards/{board_id}/webhooks/{webhook_id}"),
        )
    }

    pub fn build_list_webhook_deliveries(
        &self,
        board_id: Uuid,
        webhook_id: &str,
        query: &PageQuery,
    ) -> HttpRequest {
        let mut req = self.request(
            HttpMethod::Get,
            &format!("/boards/{board_id}/webhooks/{webhook_id}/deliveries"),
        );
        req.query = query.to_pairs();
        req
    }

    pub fn build_test_webhook(&self, board_id: Uuid, webhook_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Post,
            &format!("/boards/{board_id}/webhooks/{webhook_id}/test"),
        )
    }

    pub fn build_rotate_webhook_secret(&self, board_id: Uuid, webhook_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Post,
            &format!("/boards/{board_id}/webhooks/{webhook_id}/rotate"),
        )
    }

    pub fn parse_list_webhooks(&self, response: HttpResponse) -> Result<Vec<Webhook>, ApiError> {
        parse_list(response)
    }

    /// Shared by get, create and update.
    pub fn parse_webhook(&self, response: HttpResponse) -> Result<Webhook, ApiError> {
        parse_data(response)
    }

    pub fn parse_delete_webhook(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_empty(response)
    }

    pub fn parse_list_webhook_deliveries(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<WebhookDelivery>, ApiError> {
        parse_list(response)
    }

    /// Result of `test` and `rotate`: a flat string map (`message`,
    /// `secret`). A 204 yields an empty map.
    pub fn parse_webhook_action(
        &self,
        response: HttpResponse,
    ) -> Result<HashMap<String, String>, ApiError> {
        parse_optional_data(response).map(Option::unwrap_or_default)
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    pub fn build_list_documents(&self, board_id: Uuid) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/boards/{board_id}/documents"))
    }

    pub fn build_get_document(&self, board_id: Uuid, document_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/boards/{board_id}/documents/{document_id}"),
        )
    }

    pub fn build_create_document(
        &self,
        board_id: Uuid,
        input: &CreateDocument,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, &format!("/boards/{board_id}/documents"), input)
    }

    pub fn parse_list_documents(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<DocumentSummary>, ApiError> {
        parse_list(response)
    }

    pub fn parse_document(&self, response: HttpResponse) -> Result<Document, ApiError> {
        parse_data(response)
    }
}

/// Map non-success status codes to the matching `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let err = ApiError::from_response(response);
    tracing::warn!(
        status = response.status,
        code = err.code().unwrap_or_default(),
        "canvas API returned an error"
    );
    Err(err)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<Envelope<T>, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// `data` of the envelope, or `None` for 204.
fn parse_optional_data<T: DeserializeOwned>(response: HttpResponse) -> Result<Option<T>, ApiError> {
    check_status(&response)?;
    if response.status == 204 {
        return Ok(None);
    }
    decode(&response.body).map(|env| Some(env.data))
}

fn parse_data<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    let status = response.status;
    parse_optional_data(response)?.ok_or(ApiError::EmptyBody { status })
}

fn parse_list<T: DeserializeOwned>(response: HttpResponse) -> Result<Vec<T>, ApiError> {
    parse_page(response).map(|page| page.data)
}

fn parse_page<T: DeserializeOwned>(response: HttpResponse) -> Result<Page<T>, ApiError> {
    check_status(&response)?;
    if response.status == 204 {
        return Ok(Page {
            data: Vec::new(),
            meta: None,
        });
    }
    let env: Envelope<Vec<T>> = decode(&response.body)?;
    Ok(Page {
        data: env.data,
        meta: env.meta,
    })
}

fn parse_empty(response: HttpResponse) -> Result<(), ApiError> {
    check_status(&response)
}
