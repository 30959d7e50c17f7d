use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Board, Item, API_KEY};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", API_KEY)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", API_KEY)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_api_key_returns_401_envelope() {
    let resp = app()
        .oneshot(Request::builder().uri("/v1/boards").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

// --- boards ---

#[tokio::test]
async fn list_boards_empty() {
    let resp = app().oneshot(request("GET", "/v1/boards")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn get_board_not_found() {
    let resp = app()
        .oneshot(request("GET", "/v1/boards/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"]["message"], "Board not found");
}

#[tokio::test]
async fn create_board_rejects_blank_name() {
    let resp = app()
        .oneshot(json_request("POST", "/v1/boards", r#"{"name":"  "}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["name"].is_string());
}

// --- items lifecycle ---

#[tokio::test]
async fn item_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create board
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/v1/boards", r#"{"name":"Planning"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = body_json(resp).await;
    let board: Board = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(board.api_key.as_deref(), Some(API_KEY));
    let items_uri = format!("/v1/boards/{}/items", board.id);

    // invalid coordinates
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &items_uri,
            r#"{"type":"sticky","x":2000000,"y":0,"content":{}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // create item
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &items_uri,
            r#"{"type":"sticky","x":100,"y":200,"content":{"text":"Hello"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = body_json(resp).await;
    let item: Item = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(item.version, 1);
    let item_uri = format!("{items_uri}/{}", item.id);

    // partial update keeps other fields and bumps version
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PATCH", &item_uri, r#"{"x":5}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    let updated: Item = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(updated.x, 5.0);
    assert_eq!(updated.y, 200.0);
    assert_eq!(updated.version, 2);

    // lock
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PATCH", &format!("{item_uri}/lock"), r#"{"locked":true}"#))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["data"]["locked"], true);
    assert_eq!(body["data"]["version"], 3);

    // filtered list
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", &format!("{items_uri}?locked=false")))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["meta"]["total"], 0);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("DELETE", &item_uri))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", &item_uri))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- webhooks ---

#[tokio::test]
async fn webhook_secret_only_on_create_and_rotate() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/v1/boards", r#"{"name":"Hooks"}"#))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    let hooks_uri = format!("/v1/boards/{}/webhooks", body["data"]["id"].as_str().unwrap());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &hooks_uri,
            r#"{"url":"https://example.com/webhook","events":[]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &hooks_uri,
            r#"{"url":"https://example.com/webhook","events":["canvas_item_created"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = body_json(resp).await;
    assert!(body["data"]["secret"].as_str().unwrap().starts_with("whsec_"));
    let hook_uri = format!("{hooks_uri}/{}", body["data"]["id"].as_str().unwrap());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", &hook_uri))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert!(body["data"].get("secret").is_none());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("POST", &format!("{hook_uri}/rotate")))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert!(body["data"]["secret"].as_str().unwrap().starts_with("whsec_"));
}
