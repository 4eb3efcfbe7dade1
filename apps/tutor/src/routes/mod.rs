pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    response::Html,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::chat::handlers as chat;
use crate::export::handlers as export;
use crate::state::AppState;

/// Largest accepted resume PDF or CSV upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const INDEX_HTML: &str = include_str!("../../static/index.html");

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub fn build_router(state: AppState) -> Router {
    let uploads = Router::new()
        .route(
            "/api/v1/analysis/resume/upload",
            post(analysis::handle_resume_upload),
        )
        .route("/api/v1/analysis/dataset", post(analysis::handle_dataset))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health::health_handler))
        // Chat API
        .route("/api/v1/chat", post(chat::handle_chat))
        .route("/api/v1/chat/stream", post(chat::handle_chat_stream))
        .route("/api/v1/chat/history", get(chat::handle_history))
        .route("/api/v1/chat/events", get(chat::handle_events))
        .route("/api/v1/chat/export", get(export::handle_export))
        // Analysis API
        .route("/api/v1/analysis/resume", post(analysis::handle_resume))
        .merge(uploads)
        .with_state(state)
}
