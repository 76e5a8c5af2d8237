//! Upload orchestrator.
//!
//! `received → validated → text-extracted → blob-stored → model-extracted →
//! persisted → responded`. Every stage short-circuits on error except model
//! extraction, whose failure is recorded on the candidate instead: by then the
//! file is already durably stored.

use std::path::Path;

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::extraction::extract_text_blocking;
use crate::inference::extract::extract_profile;
use crate::inference::TextGenerator;
use crate::models::candidate::{
    CandidateRecord, EducationEntry, ExperienceEntry, ExtractedProfile, FileMetadata,
};
use crate::state::AppState;
use crate::storage::blob::{upload_resume, StoredFile};

pub const ALLOWED_EXTENSIONS: [&str; 3] = [".pdf", ".docx", ".doc"];
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = [
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
];
pub const INVALID_FILE_TYPE: &str = "Only PDF and DOCX uploads are allowed";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A file as received from the multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Serialize)]
pub struct ExtractedPreview {
    pub skills: Vec<String>,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub metadata_id: String,
    /// Document store id. The wire name is kept for existing clients.
    #[serde(rename = "mongo_id")]
    pub store_id: String,
    pub extracted_preview: ExtractedPreview,
}

/// Outcome of the model-extraction stage. Both variants become a profile.
#[derive(Debug)]
pub enum ModelExtraction {
    Structured(ExtractedProfile),
    Failed(String),
}

impl ModelExtraction {
    pub fn into_profile(self) -> ExtractedProfile {
        match self {
            ModelExtraction::Structured(profile) => profile,
            ModelExtraction::Failed(error) => ExtractedProfile::failed(error),
        }
    }
}

/// Accepts a file if either its extension or its declared content type is allowed.
pub fn validate_file_type(file_name: &str, content_type: &str) -> bool {
    let lower = file_name.to_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || ALLOWED_CONTENT_TYPES.contains(&content_type)
}

pub async fn run_model_extraction(
    generator: &dyn TextGenerator,
    model: &str,
    resume_text: &str,
) -> ModelExtraction {
    match extract_profile(generator, model, resume_text).await {
        Ok(profile) => ModelExtraction::Structured(profile),
        Err(e) => {
            warn!("Model extraction failed, storing an error-tagged record: {e}");
            ModelExtraction::Failed(e.to_string())
        }
    }
}

pub async fn process_upload(
    state: &AppState,
    upload: UploadedFile,
) -> Result<UploadResponse, AppError> {
    let UploadedFile {
        file_name,
        content_type,
        bytes,
    } = upload;

    if !validate_file_type(&file_name, &content_type) {
        return Err(AppError::Validation(INVALID_FILE_TYPE.to_string()));
    }
    info!("Upload received: {file_name} ({} bytes, {content_type})", bytes.len());

    let content_type = if content_type.is_empty() {
        FALLBACK_CONTENT_TYPE.to_string()
    } else {
        content_type
    };

    let (text, stored) = extract_and_store(state, &file_name, &content_type, bytes).await?;

    let profile = run_model_extraction(state.generator.as_ref(), &state.config.extract_model, &text)
        .await
        .into_profile();

    let record = CandidateRecord::new(
        stored.metadata_id.clone(),
        profile,
        text,
        FileMetadata {
            file_name,
            public_url: stored.public_url,
            uploaded_at: Utc::now(),
        },
    );
    let store_id = state.candidates.insert(&record).await?;
    info!("Candidate {} persisted as {store_id}", record.candidate_id);

    Ok(UploadResponse {
        status: "ok",
        metadata_id: stored.metadata_id,
        store_id,
        extracted_preview: ExtractedPreview {
            skills: record.skills,
            education: record.education,
            experience: record.experience,
        },
    })
}

/// Spools the upload to a request-unique temporary file, extracts its text and
/// stores it. The temporary file is removed when this returns, on every path.
async fn extract_and_store(
    state: &AppState,
    file_name: &str,
    content_type: &str,
    bytes: Bytes,
) -> Result<(String, StoredFile), AppError> {
    let spool = spool_upload(file_name, &bytes).await?;
    drop(bytes);

    let contents = tokio::fs::read(spool.path())
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to read spooled upload: {e}")))?;
    let text = extract_text_blocking(contents, file_name.to_string()).await?;
    info!("Extracted {} characters from {file_name}", text.len());

    let stored = upload_resume(state.files.as_ref(), spool.path(), file_name, content_type).await?;

    if let Err(e) = spool.close() {
        warn!("Failed to remove temporary upload file: {e}");
    }
    Ok((text, stored))
}

async fn spool_upload(file_name: &str, bytes: &[u8]) -> Result<NamedTempFile, AppError> {
    let suffix = Path::new(file_name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let spool = tempfile::Builder::new()
        .prefix("vitae-upload-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create temporary file: {e}")))?;

    tokio::fs::write(spool.path(), bytes)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to spool upload: {e}")))?;
    Ok(spool)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::inference::InferenceError;
    use crate::testing::ScriptedGenerator;

    #[test]
    fn test_extension_match_suffices() {
        assert!(validate_file_type("resume.PDF", "application/octet-stream"));
        assert!(validate_file_type("resume.docx", ""));
        assert!(validate_file_type("old-resume.doc", "text/plain"));
    }

    #[test]
    fn test_content_type_match_suffices() {
        assert!(validate_file_type("file.bin", "application/pdf"));
        assert!(validate_file_type("upload", "application/msword"));
        assert!(validate_file_type(
            "upload",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        ));
    }

    #[test]
    fn test_neither_match_is_rejected() {
        assert!(!validate_file_type("file.txt", "text/plain"));
        assert!(!validate_file_type("resume.pdf.exe", "application/x-msdownload"));
        assert!(!validate_file_type("", ""));
    }

    #[test]
    fn test_failed_extraction_becomes_error_tagged_profile() {
        let profile = ModelExtraction::Failed("Inference API error (status 500): boom".to_string())
            .into_profile();
        assert_eq!(profile.error.as_deref(), Some("Inference API error (status 500): boom"));
        assert!(profile.skills.is_empty());
        assert_eq!(profile.introduction, "");
    }

    #[tokio::test]
    async fn test_run_model_extraction_absorbs_api_errors() {
        let generator = ScriptedGenerator::new();
        generator.push_api_error(500, "boom");

        let outcome = run_model_extraction(&generator, "m", "text").await;
        match outcome {
            ModelExtraction::Failed(msg) => {
                assert_eq!(msg, InferenceError::Api { status: 500, body: "boom".to_string() }.to_string())
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_model_extraction_structured() {
        let generator = ScriptedGenerator::new();
        generator.push_ok(json!([{"generated_text": "{\"hobbies\": [\"climbing\"]}"}]));

        let outcome = run_model_extraction(&generator, "m", "text").await;
        assert!(matches!(outcome, ModelExtraction::Structured(ref p) if p.hobbies == vec!["climbing"]));
    }

    #[tokio::test]
    async fn test_spool_writes_bytes_and_removes_on_drop() {
        let spool = spool_upload("cv.pdf", b"%PDF").await.unwrap();
        let path = spool.path().to_path_buf();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF");
        assert!(path.to_string_lossy().ends_with(".pdf"));

        drop(spool);
        assert!(!path.exists());
    }
}
