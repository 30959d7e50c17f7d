//! Full lifecycle test against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises the blocking
//! client over real HTTP. Validates request building, the ureq transport
//! and response parsing end-to-end, including error classification and 204
//! handling.

use std::time::Duration;

use canvas_core::{
    ApiError, BlockingClient, ClientConfig, Coordinate, CreateBoard, CreateDocument, CreateItem,
    CreateWebhook, DocumentTitle, ItemPatch, ItemType, JsonMap, Limit, ListItemsQuery, PageQuery,
    PositionUpdate, WebhookEvent, WebhookPatch, WebhookStatus, WebhookUrl,
};

fn start_mock_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn client(base_url: &str, key: &str) -> BlockingClient {
    let config = ClientConfig::new(key)
        .with_base_url(base_url)
        .with_timeout(Duration::from_secs(5));
    BlockingClient::new(&config)
}

fn coord(v: f64) -> Coordinate {
    Coordinate::new(v).unwrap()
}

#[test]
fn board_and_item_lifecycle() {
    let base = start_mock_server();
    let client = client(&base, mock_server::API_KEY);

    // Step 1: no boards yet.
    assert!(client.list_boards().unwrap().is_empty());

    // Step 2: create a board; the key is only returned here.
    let board = client.create_board(&CreateBoard::new("Roadmap")).unwrap();
    assert_eq!(board.name, "Roadmap");
    assert!(board.api_key.is_some());
    let fetched = client.get_board(board.id).unwrap();
    assert!(fetched.api_key.is_none());

    // Step 3: create an item.
    let mut content = JsonMap::new();
    content.insert("text".to_string(), "Hello World".into());
    let item = client
        .create_item(
            board.id,
            &CreateItem::new(ItemType::Sticky, coord(100.0), coord(200.0), content),
        )
        .unwrap();
    assert_eq!(item.item_type, ItemType::Sticky);
    assert_eq!(item.version, 1);

    // Step 4: partial update touches only x.
    let patch = ItemPatch {
        x: Some(coord(5.0)),
        ..Default::default()
    };
    let updated = client.update_item(board.id, &item.id, &patch).unwrap();
    assert_eq!(updated.x, 5.0);
    assert_eq!(updated.y, 200.0);
    assert_eq!(updated.content["text"], "Hello World");
    assert!(updated.version > item.version);

    // Step 5: narrow updates.
    let moved = client
        .update_item_position(board.id, &item.id, &PositionUpdate::new(coord(-10.0), coord(20.0)))
        .unwrap();
    assert_eq!((moved.x, moved.y), (-10.0, 20.0));

    let mut new_content = JsonMap::new();
    new_content.insert("text".to_string(), "Edited".into());
    let edited = client
        .update_item_content(board.id, &item.id, &new_content)
        .unwrap();
    assert_eq!(edited.content["text"], "Edited");

    let locked = client.set_item_lock(board.id, &item.id, true).unwrap();
    assert!(locked.locked);
    assert!(locked.version > edited.version);

    // Step 6: filtered and paged listing.
    let query = ListItemsQuery {
        locked: Some(true),
        limit: Limit::new(1).unwrap(),
        ..Default::default()
    };
    let page = client.list_items_page(board.id, &query).unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.next_cursor(), None);

    // Step 7: delete yields no value; the item is gone afterwards.
    client.delete_item(board.id, &item.id).unwrap();
    let err = client.get_item(board.id, &item.id).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
    assert_eq!(err.status_code(), Some(404));

    // Step 8: deleting again is a NotFound, not a silent success.
    let err = client.delete_item(board.id, &item.id).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
}

#[test]
fn webhook_lifecycle() {
    let base = start_mock_server();
    let client = client(&base, mock_server::API_KEY);
    let board = client.create_board(&CreateBoard::new("Hooks")).unwrap();

    let input = CreateWebhook::new(
        WebhookUrl::new("https://example.com/webhook").unwrap(),
        vec![WebhookEvent::CanvasItemCreated, WebhookEvent::CanvasItemDeleted],
    )
    .unwrap();
    let webhook = client.create_webhook(board.id, &input).unwrap();
    assert!(webhook.secret.is_some());
    assert_eq!(webhook.status, WebhookStatus::Active);

    let listed = client.list_webhooks(board.id).unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].secret.is_none());

    let patch = WebhookPatch {
        status: Some(WebhookStatus::Paused),
        ..Default::default()
    };
    let paused = client.update_webhook(board.id, &webhook.id, &patch).unwrap();
    assert_eq!(paused.status, WebhookStatus::Paused);
    assert_eq!(paused.url, "https://example.com/webhook");

    let result = client.test_webhook(board.id, &webhook.id).unwrap();
    assert!(result.contains_key("message"));
    let deliveries = client
        .list_webhook_deliveries(board.id, &webhook.id, &PageQuery::default())
        .unwrap();
    assert_eq!(deliveries.len(), 1);
    assert!(deliveries[0].success);

    let rotated = client.rotate_webhook_secret(board.id, &webhook.id).unwrap();
    assert!(rotated["secret"].starts_with("whsec_"));

    client.delete_webhook(board.id, &webhook.id).unwrap();
    assert!(client.list_webhooks(board.id).unwrap().is_empty());
}

#[test]
fn document_lifecycle() {
    let base = start_mock_server();
    let client = client(&base, mock_server::API_KEY);
    let board = client.create_board(&CreateBoard::new("Docs")).unwrap();

    let input = CreateDocument::new(DocumentTitle::new("Notes").unwrap(), "# Heading\nbody");
    let created = client.create_document(board.id, &input).unwrap();
    assert_eq!(created.author, "canvas-rs");
    assert!(created.content.is_none());

    let summaries = client.list_documents(board.id).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].preview.as_deref(), Some("# Heading\nbody"));

    let doc = client.get_document(board.id, &created.id).unwrap();
    assert_eq!(doc.content.as_deref(), Some("# Heading\nbody"));
}

#[test]
fn wrong_api_key_is_authentication_error() {
    let base = start_mock_server();
    let client = client(&base, "dc_wrong");

    let err = client.list_boards().unwrap_err();
    assert!(matches!(err, ApiError::Authentication { .. }));
    assert_eq!(err.status_code(), Some(401));
    assert_eq!(err.to_string(), "[UNAUTHORIZED] Invalid or missing API key");
}

#[test]
fn server_validation_error_carries_details() {
    let base = start_mock_server();
    let client = client(&base, mock_server::API_KEY);

    let err = client.create_board(&CreateBoard::new(" ")).unwrap_err();
    match err {
        ApiError::Validation { details, .. } => {
            assert!(details.unwrap()["name"].is_string());
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[test]
fn unreachable_host_is_transport_error() {
    // Bind and drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = client(&format!("http://127.0.0.1:{port}"), "k");

    let err = client.list_boards().unwrap_err();
    assert!(err.is_transport(), "expected transport error, got {err:?}");
    assert_eq!(err.status_code(), None);
}

#[test]
fn silent_server_times_out() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept and read the request, but never answer.
    let silent = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(3))).unwrap();
        let mut sink = Vec::new();
        let _ = std::io::Read::read_to_end(&mut stream, &mut sink);
    });

    let config = ClientConfig::new("k")
        .with_base_url(format!("http://{addr}"))
        .with_timeout(Duration::from_millis(300));
    let started = std::time::Instant::now();
    let err = BlockingClient::new(&config).list_boards().unwrap_err();

    assert!(matches!(err, ApiError::Timeout(_)), "expected timeout, got {err:?}");
    assert!(err.is_transport());
    assert!(matches!(err, ApiError::Timeout(t) if t == Duration::from_millis(300)));
    assert!(started.elapsed() < Duration::from_secs(5));
    silent.join().unwrap();
}
