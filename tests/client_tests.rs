use portfolio_chat::config::Config;
use portfolio_chat::routes::create_router;
use portfolio_chat::services::chatbot::{CompletionBackend, CompletionError};
use portfolio_chat::services::portfolio::Portfolio;
use portfolio_chat::services::session_manager::Message;
use portfolio_chat::state::AppState;
use portfolio_chat::widget::api::{
    ApiResponse, ChatApi, ClientError, DEFAULT_ERROR, HttpChatApi, NETWORK_ERROR,
};
use portfolio_chat::widget::events::{Dialogs, WidgetEvent};
use portfolio_chat::widget::{ChatWidget, WidgetConfig};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn client_for(chat: Router) -> HttpChatApi {
    HttpChatApi::new(&serve(chat).await).unwrap()
}

#[tokio::test]
async fn success_body_yields_response_text() {
    let api = client_for(Router::new().route(
        "/api/chat",
        post(|| async { Json(json!({ "status": "success", "response": "5 years." })) }),
    ))
    .await;

    assert_eq!(api.send_message("What is your experience?").await, ApiResponse::ok("5 years."));
}

#[tokio::test]
async fn server_error_text_is_passed_through() {
    let api = client_for(Router::new().route(
        "/api/chat",
        post(|| async {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "status": "error", "error": "API Error: 503" })))
        }),
    ))
    .await;

    assert_eq!(api.send_message("hi").await, ApiResponse::failed("API Error: 503"));
}

#[tokio::test]
async fn missing_error_text_falls_back() {
    let api = client_for(
        Router::new().route(
            "/api/chat",
            post(|| async { (StatusCode::BAD_GATEWAY, Json(json!({ "status": "error" }))) }),
        ),
    )
    .await;
    assert_eq!(api.send_message("hi").await, ApiResponse::failed(DEFAULT_ERROR));

    // HTTP ok, but the body does not report success.
    let api = client_for(
        Router::new().route("/api/chat", post(|| async { Json(json!({ "status": "pending" })) })),
    )
    .await;
    assert_eq!(api.send_message("hi").await, ApiResponse::failed(DEFAULT_ERROR));
}

#[tokio::test]
async fn unreadable_body_counts_as_network_error() {
    let api = client_for(Router::new().route(
        "/api/chat",
        post(|| async { (StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>").into_response() }),
    ))
    .await;

    assert_eq!(api.send_message("hi").await, ApiResponse::failed(NETWORK_ERROR));
}

#[tokio::test]
async fn refused_connection_counts_as_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpChatApi::new(&format!("http://{addr}")).unwrap();
    assert_eq!(api.send_message("hi").await, ApiResponse::failed(NETWORK_ERROR));
    assert!(matches!(api.clear_chat().await, Err(ClientError::Transport(_))));
}

#[tokio::test]
async fn clear_succeeds_only_on_2xx() {
    let api = client_for(Router::new().route("/api/clear", post(|| async { StatusCode::NO_CONTENT }))).await;
    assert!(api.clear_chat().await.is_ok());

    let api = client_for(
        Router::new().route("/api/clear", post(|| async { StatusCode::SERVICE_UNAVAILABLE })),
    )
    .await;
    assert!(matches!(
        api.clear_chat().await,
        Err(ClientError::Status(status)) if status == StatusCode::SERVICE_UNAVAILABLE
    ));
}

struct CountTurns;

#[async_trait]
impl CompletionBackend for CountTurns {
    async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError> {
        Ok(format!("{} turns", messages.len()))
    }
}

struct AlwaysYes;

#[async_trait]
impl Dialogs for AlwaysYes {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }

    async fn alert(&self, message: &str) {
        panic!("unexpected alert: {message}");
    }
}

#[tokio::test]
async fn widget_round_trip_against_backend() {
    let portfolio = Portfolio::sample().unwrap();
    let config = WidgetConfig::for_portfolio(&portfolio);
    let state = AppState::new(&Config::default(), portfolio, Arc::new(CountTurns));
    let base = serve(create_router("static").with_state(Arc::new(state))).await;

    let mut widget = ChatWidget::new(HttpChatApi::new(&base).unwrap(), AlwaysYes, &config);

    widget.handle(WidgetEvent::QuickQuestion("What are your skills?".to_string())).await;
    widget.handle(WidgetEvent::Input("And your projects?".to_string())).await;
    widget.handle(WidgetEvent::Submit).await;

    {
        let view = widget.view();
        assert_eq!(view.messages.len(), 5);
        assert_eq!(view.messages[2].text, "2 turns");
        // The session cookie carried the first exchange into the second.
        assert_eq!(view.messages[4].text, "4 turns");
    }

    widget.handle(WidgetEvent::ClearRequested).await;
    assert_eq!(widget.view().messages.len(), 1);
    assert!(widget.view().has_quick_questions());

    widget.handle(WidgetEvent::Input("Hello again".to_string())).await;
    widget.handle(WidgetEvent::Submit).await;
    assert_eq!(widget.view().messages.last().unwrap().text, "2 turns");
}
