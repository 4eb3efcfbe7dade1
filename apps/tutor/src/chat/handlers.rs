//! Axum route handlers for the Chat API.

use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::{BroadcastStream, ReceiverStream};
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use crate::chat::models::Turn;
use crate::chat::pacing::{ChunkSink, Paced};
use crate::chat::session::{Exchange, SessionState};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub state: SessionState,
    pub turns: Vec<Turn>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/chat/history
///
/// Waits for any in-flight exchange to finish; progress while the AI is
/// answering is reported on `/api/v1/chat/events`.
pub async fn handle_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let session = state.session.lock().await;
    Json(HistoryResponse {
        state: session.state(),
        turns: session.transcript().all().to_vec(),
    })
}

/// POST /api/v1/chat
///
/// Runs one full exchange and returns both stored turns.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Exchange>, AppError> {
    let exchange = state.session.lock().await.submit(&request.question).await?;
    Ok(Json(exchange))
}

/// POST /api/v1/chat/stream
///
/// Same exchange as `handle_chat`, but the stored answer is revealed word by word
/// as `chunk` events (JSON strings, whitespace included), followed by a `done`
/// event carrying the stored turns.
pub async fn handle_chat_stream(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let exchange = state.session.lock().await.submit(&request.question).await?;

    let done = Event::default()
        .event("done")
        .json_data(&exchange)
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

    let (tx, rx) = mpsc::channel::<String>(32);
    let delay = Duration::from_millis(state.config.stream_word_delay_ms);
    let answer = exchange.assistant.text().to_string();
    tokio::spawn(async move {
        let mut paced = Paced::new(tx, delay);
        if paced.write_chunk(answer).await.is_err() {
            debug!("Stream client disconnected before the answer was fully revealed");
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|chunk| Event::default().event("chunk").json_data(chunk))
        .chain(tokio_stream::once(Ok(done)));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// GET /api/v1/chat/events
///
/// Server-sent `state` events; clients re-fetch the history on each one.
pub async fn handle_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = BroadcastStream::new(state.events.subscribe())
        .filter_map(|event| event.ok())
        .map(|event| Event::default().event("state").json_data(event));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
