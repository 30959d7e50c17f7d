//! Blocking HTTP execution and the convenience client built on it.
//!
//! # Design
//! `Transport` is the seam between the pure `CanvasClient` and the network.
//! `UreqTransport` owns one `ureq::Agent`, created with the configured
//! timeout and with status-as-error disabled so 4xx/5xx come back as data
//! for `CanvasClient` to classify. `BlockingClient` runs
//! build → execute → parse for each operation and never retries.

use std::collections::HashMap;
use std::time::Duration;

use uuid::Uuid;

use crate::client::CanvasClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    Board, CanvasItem, CreateBoard, CreateDocument, CreateItem, CreateWebhook, Document,
    DocumentSummary, ItemPatch, JsonMap, ListItemsQuery, Page, PageQuery, PositionUpdate, Webhook,
    WebhookDelivery, WebhookPatch,
};

/// Executes one `HttpRequest` and returns the response as data.
///
/// Implementations must return non-2xx responses as `Ok`; only failures
/// where no response was read are `Err` (`Timeout` or `Network`).
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// `Transport` backed by a `ureq::Agent`.
pub struct UreqTransport {
    agent: ureq::Agent,
    timeout: Duration,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent, timeout }
    }

    fn map_error(&self, err: ureq::Error) -> ApiError {
        match err {
            ureq::Error::Timeout(_) => ApiError::Timeout(self.timeout),
            ureq::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
                ApiError::Timeout(self.timeout)
            }
            other => ApiError::Network(other.to_string()),
        }
    }
}

fn decorate<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.as_str();
        let body = request.body.as_deref().map(str::as_bytes);

        let result = match (request.method, body) {
            (HttpMethod::Get, _) => decorate(self.agent.get(url), &request).call(),
            (HttpMethod::Delete, _) => decorate(self.agent.delete(url), &request).call(),
            (HttpMethod::Post, Some(body)) => decorate(self.agent.post(url), &request).send(body),
            (HttpMethod::Post, None) => decorate(self.agent.post(url), &request).send_empty(),
            (HttpMethod::Patch, Some(body)) => decorate(self.agent.patch(url), &request).send(body),
            (HttpMethod::Patch, None) => decorate(self.agent.patch(url), &request).send_empty(),
        };

        let mut response = result.map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = if status == 204 {
            String::new()
        } else {
            response
                .body_mut()
                .read_to_string()
                .map_err(|e| self.map_error(e))?
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Blocking client: one HTTP round-trip per call.
///
/// Owns its transport; the underlying connections are released when the
/// client is dropped or [`BlockingClient::close`] is called. Separate
/// instances share nothing and can be used from different threads.
pub struct BlockingClient {
    client: CanvasClient,
    transport: Box<dyn Transport>,
}

impl BlockingClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new(config.timeout))
    }

    pub fn with_transport(config: &ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            client: CanvasClient::new(config),
            transport: Box::new(transport),
        }
    }

    /// The request builder this client wraps.
    pub fn requests(&self) -> &CanvasClient {
        &self.client
    }

    /// Release the transport. Equivalent to dropping the client.
    pub fn close(self) {
        drop(self);
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method.as_str();
        tracing::debug!(method, url = %request.url, "canvas request");
        let response = self.transport.execute(request).map_err(|err| {
            tracing::warn!(method, error = %err, "canvas request failed before a response");
            err
        })?;
        tracing::debug!(method, status = response.status, "canvas response");
        Ok(response)
    }

    // Boards

    pub fn list_boards(&self) -> Result<Vec<Board>, ApiError> {
        let resp = self.send(self.client.build_list_boards())?;
        self.client.parse_list_boards(resp)
    }

    pub fn get_board(&self, board_id: Uuid) -> Result<Board, ApiError> {
        let resp = self.send(self.client.build_get_board(board_id))?;
        self.client.parse_get_board(resp)
    }

    pub fn create_board(&self, input: &CreateBoard) -> Result<Board, ApiError> {
        let resp = self.send(self.client.build_create_board(input)?)?;
        self.client.parse_create_board(resp)
    }

    // Items

    pub fn list_items(&self, board_id: Uuid, query: &ListItemsQuery) -> Result<Vec<CanvasItem>, ApiError> {
        let resp = self.send(self.client.build_list_items(board_id, query))?;
        self.client.parse_list_items(resp)
    }

    pub fn list_items_page(
        &self,
        board_id: Uuid,
        query: &ListItemsQuery,
    ) -> Result<Page<CanvasItem>, ApiError> {
        let resp = self.send(self.client.build_list_items(board_id, query))?;
        self.client.parse_list_items_page(resp)
    }

    pub fn get_item(&self, board_id: Uuid, item_id: &str) -> Result<CanvasItem, ApiError> {
        let resp = self.send(self.client.build_get_item(board_id, item_id))?;
        self.client.parse_item(resp)
    }

    pub fn create_item(&self, board_id: Uuid, input: &CreateItem) -> Result<CanvasItem, ApiError> {
        let resp = self.send(self.client.build_create_item(board_id, input)?)?;
        self.client.parse_item(resp)
    }

    pub fn update_item(
        &self,
        board_id: Uuid,
        item_id: &str,
        patch: &ItemPatch,
    ) -> Result<CanvasItem, ApiError> {
        let resp = self.send(self.client.build_update_item(board_id, item_id, patch)?)?;
        self.client.parse_item(resp)
    }

    pub fn delete_item(&self, board_id: Uuid, item_id: &str) -> Result<(), ApiError> {
        let resp = self.send(self.client.build_delete_item(board_id, item_id))?;
        self.client.parse_delete_item(resp)
    }

    pub fn update_item_position(
        &self,
        board_id: Uuid,
        item_id: &str,
        position: &PositionUpdate,
    ) -> Result<CanvasItem, ApiError> {
        let req = self
            .client
            .build_update_item_position(board_id, item_id, position)?;
        let resp = self.send(req)?;
        self.client.parse_item(resp)
    }

    pub fn update_item_content(
        &self,
        board_id: Uuid,
        item_id: &str,
        content: &JsonMap,
    ) -> Result<CanvasItem, ApiError> {
        let req = self
            .client
            .build_update_item_content(board_id, item_id, content)?;
        let resp = self.send(req)?;
        self.client.parse_item(resp)
    }

    pub fn set_item_lock(&self, board_id: Uuid, item_id: &str, locked: bool) -> Result<CanvasItem, ApiError> {
        let resp = self.send(self.client.build_set_item_lock(board_id, item_id, locked)?)?;
        self.client.parse_item(resp)
    }

    // Webhooks

    pub fn list_webhooks(&self, board_id: Uuid) -> Result<Vec<Webhook>, ApiError> {
        let resp = self.send(self.client.build_list_webhooks(board_id))?;
        self.client.parse_list_webhooks(resp)
    }

    pub fn get_webhook(&self, board_id: Uuid, webhook_id: &str) -> Result<Webhook, ApiError> {
        let resp = self.send(self.client.build_get_webhook(board_id, webhook_id))?;
        self.client.parse_webhook(resp)
    }

    pub fn create_webhook(&self, board_id: Uuid, input: &CreateWebhook) -> Result<Webhook, ApiError> {
        let resp = self.send(self.client.build_create_webhook(board_id, input)?)?;
        self.client.parse_webhook(resp)
    }

    pub fn update_webhook(
        &self,
        board_id: Uuid,
        webhook_id: &str,
        patch: &WebhookPatch,
    ) -> Result<Webhook, ApiError> {
        let resp = self.send(self.client.build_update_webhook(board_id, webhook_id, patch)?)?;
        self.client.parse_webhook(resp)
    }

    pub fn delete_webhook(&self, board_id: Uuid, webhook_id: &str) -> Result<(), ApiError> {
        let resp = self.send(self.client.build_delete_webhook(board_id, webhook_id))?;
        self.client.parse_delete_webhook(resp)
    }

    pub fn list_webhook_deliveries(
        &self,
        board_id: Uuid,
        webhook_id: &str,
        query: &PageQuery,
    ) -> Result<Vec<WebhookDelivery>, ApiError> {
        let req = self
            .client
            .build_list_webhook_deliveries(board_id, webhook_id, query);
        let resp = self.send(req)?;
        self.client.parse_list_webhook_deliveries(resp)
    }

    pub fn test_webhook(&self, board_id: Uuid, webhook_id: &str) -> Result<HashMap<String, String>, ApiError> {
        let resp = self.send(self.client.build_test_webhook(board_id, webhook_id))?;
        self.client.parse_webhook_action(resp)
    }

    /// Returns the map holding the new `secret`.
    pub fn rotate_webhook_secret(
        &self,
        board_id: Uuid,
        webhook_id: &str,
    ) -> Result<HashMap<String, String>, ApiError> {
        let resp = self.send(self.client.build_rotate_webhook_secret(board_id, webhook_id))?;
        self.client.parse_webhook_action(resp)
    }

    // Documents

    pub fn list_documents(&self, board_id: Uuid) -> Result<Vec<DocumentSummary>, ApiError> {
        let resp = self.send(self.client.build_list_documents(board_id))?;
        self.client.parse_list_documents(resp)
    }

    pub fn get_document(&self, board_id: Uuid, document_id: &str) -> Result<Document, ApiError> {
        let resp = self.send(self.client.build_get_document(board_id, document_id))?;
        self.client.parse_document(resp)
    }

    pub fn create_document(&self, board_id: Uuid, input: &CreateDocument) -> Result<Document, ApiError> {
        let resp = self.send(self.client.build_create_document(board_id, input)?)?;
        self.client.parse_document(resp)
    }
}
