use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::extraction::identity::{extract_for_review, IdentityExtraction};
use crate::extraction::resume::{detect_format, extract_text};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ParseResumeResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractIdentityRequest {
    #[serde(default)]
    pub resume_text: String,
}

struct UploadedResume {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/parseResume
/// Multipart upload with a single `file` field; returns the extracted text.
pub async fn handle_parse_resume(
    multipart: Multipart,
) -> Result<Json<ParseResumeResponse>, AppError> {
    let upload = read_upload(multipart)
        .await?
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    let format = detect_format(
        &upload.filename,
        upload.content_type.as_deref(),
        &upload.data,
    )?;
    let size = upload.data.len();

    let data = upload.data;
    let text = tokio::task::spawn_blocking(move || extract_text(format, &data))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    info!(
        "Parsed resume '{}' ({format:?}, {size} bytes -> {} chars)",
        upload.filename,
        text.chars().count()
    );
    Ok(Json(ParseResumeResponse { text }))
}

/// POST /api/extractIdentity
/// Best-effort contact extraction; never fails on model errors.
pub async fn handle_extract_identity(
    State(state): State<AppState>,
    Json(req): Json<ExtractIdentityRequest>,
) -> Json<IdentityExtraction> {
    Json(extract_for_review(state.extractor.as_ref(), &req.resume_text).await)
}

async fn read_upload(mut multipart: Multipart) -> Result<Option<UploadedResume>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read form field: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("resume").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file data: {e}")))?;

        if data.is_empty() {
            return Ok(None);
        }
        return Ok(Some(UploadedResume {
            filename,
            content_type,
            data,
        }));
    }
    Ok(None)
}
