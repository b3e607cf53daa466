use portfolio_chat::config::Config;
use portfolio_chat::message::{ChatResponse, ClearResponse, HealthResponse};
use portfolio_chat::routes::create_router;
use portfolio_chat::services::chatbot::{CompletionBackend, CompletionError};
use portfolio_chat::services::portfolio::Portfolio;
use portfolio_chat::services::session_manager::Message;
use portfolio_chat::state::AppState;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use std::sync::Arc;
use tower::util::ServiceExt;

enum Stub {
    Reply(&'static str),
    Status(u16),
    Timeout,
    /// Answers with the number of prompt messages it was given.
    CountTurns,
}

#[async_trait]
impl CompletionBackend for Stub {
    async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError> {
        match self {
            Stub::Reply(text) => Ok(text.to_string()),
            Stub::Status(code) => Err(CompletionError::Status(*code)),
            Stub::Timeout => Err(CompletionError::Timeout),
            Stub::CountTurns => Ok(format!("{} turns", messages.len())),
        }
    }
}

fn app(stub: Stub) -> Router {
    let state = AppState::new(&Config::default(), Portfolio::sample().unwrap(), Arc::new(stub));
    create_router("static").with_state(Arc::new(state))
}

fn chat_request(message: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(serde_json::json!({ "message": message }).to_string()))
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn session_cookie(response: &Response<Body>) -> String {
    let raw = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    raw.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_chat_endpoint() {
    let response = app(Stub::Reply("5 years."))
        .oneshot(chat_request("What is your experience?", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).starts_with("portfolio_chat_session="));

    let body: ChatResponse = read_json(response).await;
    assert!(body.is_success());
    assert_eq!(body.response.as_deref(), Some("5 years."));
    assert!(body.error.is_none());
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let response = app(Stub::Reply("unused")).oneshot(chat_request("   \n ", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ChatResponse = read_json(response).await;
    assert_eq!(body.status, "error");
    assert_eq!(body.error.as_deref(), Some("Message cannot be empty"));
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app(Stub::Reply("unused")).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upstream_failures_map_to_error_bodies() {
    let response = app(Stub::Status(503)).oneshot(chat_request("hi", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ChatResponse = read_json(response).await;
    assert_eq!(body.error.as_deref(), Some("API Error: 503"));

    let response = app(Stub::Timeout).oneshot(chat_request("hi", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: ChatResponse = read_json(response).await;
    assert_eq!(body.error.as_deref(), Some("Request timeout. Please try again."));
}

#[tokio::test]
async fn test_conversation_memory_and_clear() {
    let app = app(Stub::CountTurns);

    // system + user
    let response = app.clone().oneshot(chat_request("hello", None)).await.unwrap();
    let cookie = session_cookie(&response);
    let body: ChatResponse = read_json(response).await;
    assert_eq!(body.response.as_deref(), Some("2 turns"));

    // system + user + assistant + user
    let response = app.clone().oneshot(chat_request("and then?", Some(&cookie))).await.unwrap();
    let body: ChatResponse = read_json(response).await;
    assert_eq!(body.response.as_deref(), Some("4 turns"));

    let clear = Request::builder()
        .method("POST")
        .uri("/api/clear")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(clear).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: ClearResponse = read_json(response).await;
    assert_eq!(body.status, "success");
    assert_eq!(body.message, "Chat cleared");

    let response = app.oneshot(chat_request("fresh start", Some(&cookie))).await.unwrap();
    let body: ChatResponse = read_json(response).await;
    assert_eq!(body.response.as_deref(), Some("2 turns"));
}

#[tokio::test]
async fn test_history_is_capped() {
    let app = app(Stub::CountTurns);
    let response = app.clone().oneshot(chat_request("one", None)).await.unwrap();
    let cookie = session_cookie(&response);

    let mut last = String::new();
    for i in 0..7 {
        let response = app
            .clone()
            .oneshot(chat_request(&format!("message {i}"), Some(&cookie)))
            .await
            .unwrap();
        let body: ChatResponse = read_json(response).await;
        last = body.response.unwrap();
    }
    // Ten remembered messages plus the system prompt.
    assert_eq!(last, "11 turns");
}

#[tokio::test]
async fn test_failed_turn_is_not_remembered() {
    let state = Arc::new(AppState::new(
        &Config::default(),
        Portfolio::sample().unwrap(),
        Arc::new(Stub::Status(500)),
    ));
    let app = create_router("static").with_state(state.clone());

    let response = app.oneshot(chat_request("hello", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(state.sessions.list_session_ids().await.is_empty());
}

#[tokio::test]
async fn test_failed_requests_do_not_accumulate_sessions() {
    let state = Arc::new(AppState::new(
        &Config::default(),
        Portfolio::sample().unwrap(),
        Arc::new(Stub::Status(401)),
    ));
    let app = create_router("static").with_state(state.clone());

    for _ in 0..5 {
        let response = app.clone().oneshot(chat_request("hello", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
    assert_eq!(state.sessions.len().await, 0);

    // A later success still starts a session normally.
    let state = Arc::new(AppState::new(
        &Config::default(),
        Portfolio::sample().unwrap(),
        Arc::new(Stub::Reply("hi")),
    ));
    let app = create_router("static").with_state(state.clone());
    let response = app.oneshot(chat_request("hello", None)).await.unwrap();
    assert!(session_cookie(&response).starts_with("portfolio_chat_session="));
    assert_eq!(state.sessions.len().await, 1);
}

#[tokio::test]
async fn test_clear_without_session_still_succeeds() {
    let request = Request::builder().method("POST").uri("/api/clear").body(Body::empty()).unwrap();
    let response = app(Stub::Reply("unused")).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_portfolio() {
    let app = app(Stub::Reply("unused"));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body: HealthResponse = read_json(response).await;
    assert_eq!(body.status, "healthy");
    assert_eq!(body.service, "Portfolio Chatbot API");

    let response = app
        .oneshot(Request::builder().uri("/api/portfolio").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = read_json(response).await;
    assert_eq!(body["name"], "Alex Morgan");
    assert!(body["projects"].as_array().is_some_and(|p| !p.is_empty()));
}

#[tokio::test]
async fn test_index_renders_initial_widget() {
    let response = app(Stub::Reply("unused"))
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("id=\"chatMessages\""));
    assert!(html.contains("class=\"message bot-message\""));
    assert!(html.contains("<span>AM</span>"));
    assert!(html.contains("data-question=\"What are your skills?\""));
    // The page is usable without any static assets.
    assert!(html.contains("<style>"));
    assert!(html.contains("fetch(\"/api/chat\""));
    assert!(html.contains("fetch(\"/api/clear\""));
}
