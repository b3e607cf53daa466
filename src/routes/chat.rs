use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{
        HeaderMap,
        header::{COOKIE, SET_COOKIE},
    },
    response::{AppendHeaders, Html, IntoResponse},
};

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse, ClearResponse, HealthResponse},
    services::{
        chatbot::generate_reply,
        portfolio::Portfolio,
        session_manager::{Message, MessageRole},
    },
    state::SharedState,
    widget::{render::render_page, view::LocalClock},
};

pub const SESSION_COOKIE: &str = "portfolio_chat_session";

pub async fn chat_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let trimmed = payload.message.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }

    let session_id = state.sessions.resolve(session_cookie(&headers).as_deref()).await;

    // The prompt sees the new message; the session only keeps it once the
    // model has answered.
    let mut history = state.sessions.get_history(&session_id).await.unwrap_or_default();
    history.push(Message { role: MessageRole::User, content: trimmed.to_string() });
    let limit = state.sessions.history_limit();
    if history.len() > limit {
        history.drain(..history.len() - limit);
    }

    let reply = generate_reply(state.backend.as_ref(), &state.system_prompt, &history).await?;

    state.sessions.append_message(&session_id, MessageRole::User, trimmed).await;
    state.sessions.append_message(&session_id, MessageRole::Assistant, reply.as_str()).await;
    tracing::info!(session = %session_id, "chat reply sent");

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie_header(&session_id, state.sessions.ttl().as_secs()))]),
        Json(ChatResponse::success(reply)),
    ))
}

pub async fn clear_handler(State(state): State<SharedState>, headers: HeaderMap) -> Json<ClearResponse> {
    if let Some(id) = session_cookie(&headers) {
        if state.sessions.clear_history(&id).await {
            tracing::info!(session = %id, "conversation cleared");
        }
    }
    Json(ClearResponse { status: "success".to_string(), message: "Chat cleared".to_string() })
}

pub async fn portfolio_handler(State(state): State<SharedState>) -> Json<Portfolio> {
    Json(state.portfolio.clone())
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "Portfolio Chatbot API".to_string(),
    })
}

pub async fn index_handler(State(state): State<SharedState>) -> Html<String> {
    let view = state.widget.initial_view(&LocalClock);
    Html(render_page(&view, &state.widget.page))
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn session_cookie_header(session_id: &str, max_age: u64) -> String {
    format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}
