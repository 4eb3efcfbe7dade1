//! Axum route handler for the transcript export.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::export::export_transcript;
use crate::state::AppState;

pub const EXPORT_FILE_NAME: &str = "chat_history.pdf";

/// GET /api/v1/chat/export
///
/// Returns the current transcript as a downloadable PDF.
pub async fn handle_export(State(state): State<AppState>) -> Result<Response, AppError> {
    let transcript = state.session.lock().await.transcript().clone();
    let config = state.page_config.clone();
    let turns = transcript.len();
    if transcript.is_empty() {
        debug!("Exporting an empty chat history; the document holds only the title");
    }

    // Layout is CPU-bound; keep it off the async executor.
    let pdf = tokio::task::spawn_blocking(move || export_transcript(&transcript, &config))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in export: {e}")))?;

    info!(turns, bytes = pdf.len(), "Chat history exported");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        Bytes::from(pdf),
    )
        .into_response())
}
