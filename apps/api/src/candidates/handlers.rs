//! Axum route handlers for the candidate API.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::candidates::query::{self, AnswerResponse, CandidateList};
use crate::candidates::upload::{process_upload, UploadResponse, UploadedFile};
use crate::errors::AppError;
use crate::state::AppState;
use crate::storage::candidates::StoredCandidate;

const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// POST /upload
///
/// Multipart upload of a single resume in the `file` field.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart =
        multipart.map_err(|e| AppError::Validation(format!("Expected a multipart upload: {e}")))?;
    let upload = read_file_field(&mut multipart, state.config.max_upload_bytes).await?;
    Ok(Json(process_upload(&state, upload).await?))
}

/// GET /candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<CandidateList>, AppError> {
    Ok(Json(query::list(state.candidates.as_ref()).await?))
}

/// GET /candidate/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
) -> Result<Json<StoredCandidate>, AppError> {
    Ok(Json(query::lookup(state.candidates.as_ref(), &candidate_id).await?))
}

/// POST /ask/:id
pub async fn handle_ask(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
    request: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, AppError> {
    let Json(request) =
        request.map_err(|e| AppError::Validation(format!("Invalid question body: {}", e.body_text())))?;
    Ok(Json(query::answer(&state, &candidate_id, &request.question).await?))
}

async fn read_file_field(
    multipart: &mut Multipart,
    max_upload_bytes: usize,
) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_upload_bytes, "Invalid multipart body"))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_upload_bytes, "Failed to read uploaded file"))?;

        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(AppError::Validation(format!(
        "Missing '{FILE_FIELD}' field in upload"
    )))
}

fn multipart_error(error: MultipartError, max_upload_bytes: usize, context: &str) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!(
            "Upload exceeds the {max_upload_bytes} byte size limit"
        ))
    } else {
        AppError::Validation(format!("{context}: {error}"))
    }
}
