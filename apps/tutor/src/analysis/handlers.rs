//! Axum route handlers for resume review and dataset analysis.

use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::dataset::{analyze_dataset, parse_csv, Histogram};
use crate::analysis::resume::{analyze_resume, extract_pdf_text, ResumeError};
use crate::errors::AppError;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub resume_text: String,
}

#[derive(Debug, Serialize)]
pub struct ResumeResponse {
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct DatasetResponse {
    pub file_name: Option<String>,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub preview: String,
    pub histogram: Histogram,
    pub insights: String,
}

/// An uploaded file pulled out of a multipart body.
struct Upload {
    file_name: Option<String>,
    bytes: Bytes,
}

impl From<ResumeError> for AppError {
    fn from(err: ResumeError) -> Self {
        match err {
            ResumeError::Empty => AppError::Validation(err.to_string()),
            ResumeError::Pdf(_) | ResumeError::NoText => {
                AppError::UnprocessableEntity(err.to_string())
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analysis/resume
///
/// Reviews pasted resume text. Adapter failures come back as the feedback text.
pub async fn handle_resume(
    State(state): State<AppState>,
    Json(request): Json<ResumeRequest>,
) -> Result<Json<ResumeResponse>, AppError> {
    let feedback = analyze_resume(&request.resume_text, state.llm.as_ref()).await?;
    Ok(Json(ResumeResponse { feedback }))
}

/// POST /api/v1/analysis/resume/upload
///
/// Multipart upload of a PDF resume; its text layer is reviewed like pasted text.
pub async fn handle_resume_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ResumeResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let size = upload.bytes.len();

    // PDF parsing is CPU-bound; keep it off the async executor.
    let text = tokio::task::spawn_blocking(move || extract_pdf_text(&upload.bytes))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF extract: {e}"))
        })??;

    info!(bytes = size, chars = text.len(), "Resume PDF extracted");

    let feedback = analyze_resume(&text, state.llm.as_ref()).await?;
    Ok(Json(ResumeResponse { feedback }))
}

/// POST /api/v1/analysis/dataset
///
/// Multipart upload of a CSV file. Returns the preview, the first-column
/// histogram, and the model's insights on the preview.
pub async fn handle_dataset(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DatasetResponse>, AppError> {
    let upload = read_upload(multipart).await?;

    let dataset =
        parse_csv(&upload.bytes).map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    info!(
        file = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        columns = dataset.columns().len(),
        rows = dataset.row_count(),
        "Dataset uploaded"
    );

    let insights = analyze_dataset(&dataset, state.llm.as_ref()).await;

    Ok(Json(DatasetResponse {
        file_name: upload.file_name,
        columns: dataset.columns().to_vec(),
        row_count: dataset.row_count(),
        preview: dataset.preview_text(),
        histogram: dataset.first_column_histogram(),
        insights,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Takes the `file` field, or the first field carrying a file name when no field
/// is named `file`.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut fallback: Option<Upload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        let is_named = field.name() == Some(UPLOAD_FIELD);
        let has_file_name = field.file_name().is_some();
        if !is_named && (fallback.is_some() || !has_file_name) {
            continue;
        }

        let upload = read_field(field).await?;
        if is_named {
            return Ok(upload);
        }
        fallback = Some(upload);
    }

    fallback.ok_or_else(|| AppError::Validation(format!("missing '{UPLOAD_FIELD}' upload")))
}

async fn read_field(field: Field<'_>) -> Result<Upload, AppError> {
    let file_name = field.file_name().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }
    Ok(Upload { file_name, bytes })
}
