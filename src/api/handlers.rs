//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{ErrorResponse, HealthResponse};
use super::AppState;
use crate::producer::produce;
use crate::protocol::ChatRequest;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Reported by `/version`
pub const VERSION: &str = concat!("chat_stream ", env!("CARGO_PKG_VERSION"));

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Reply streaming
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Chat
// ============================================================

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    if req.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".to_string()));
    }

    tracing::info!(
        source = state.source.name(),
        history = req.history.len(),
        "Streaming reply"
    );

    let events = produce(state.source.reply(&req));
    Ok(sse_stream(events, state.keep_alive))
}

// ============================================================
// Health and version
// ============================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn get_version() -> &'static str {
    VERSION
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        tracing::debug!(%status, error = %message, "Request rejected");
        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
