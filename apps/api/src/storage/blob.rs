use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::StorageError;

/// Blob storage for uploaded resume files plus their metadata rows.
#[async_trait]
pub trait ResumeStorage: Send + Sync {
    /// Stores `bytes` under `path` and returns the object's public URL.
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Records a metadata row for a stored file and returns its generated id.
    async fn insert_metadata(&self, file_name: &str, public_url: &str)
        -> Result<String, StorageError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub metadata_id: String,
    pub public_url: String,
    pub storage_path: String,
}

/// Uploads the spooled file at `local_path` and records its metadata.
/// Any failure of either step fails the whole upload.
pub async fn upload_resume(
    storage: &dyn ResumeStorage,
    local_path: &Path,
    file_name: &str,
    content_type: &str,
) -> Result<StoredFile, StorageError> {
    let bytes = tokio::fs::read(local_path).await?;
    let storage_path = storage_path(file_name, Utc::now());

    let public_url = storage
        .put_object(&storage_path, bytes, content_type)
        .await?;
    let metadata_id = storage.insert_metadata(file_name, &public_url).await?;

    info!("Stored {file_name} at {public_url} (metadata id {metadata_id})");
    Ok(StoredFile {
        metadata_id,
        public_url,
        storage_path,
    })
}

/// Object key for an upload: `<stem>_<unix micros><.ext>`, with the stem
/// reduced to URL-safe characters.
pub fn storage_path(file_name: &str, now: DateTime<Utc>) -> String {
    let path = Path::new(file_name);
    let stem: String = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.is_empty() { "resume".to_string() } else { stem };
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    format!("{stem}_{}{extension}", now.timestamp_micros())
}

/// S3-compatible bucket (MinIO locally) with metadata rows in PostgreSQL.
#[derive(Clone)]
pub struct S3ResumeStorage {
    s3: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
    pool: PgPool,
}

impl S3ResumeStorage {
    pub fn new(
        s3: aws_sdk_s3::Client,
        bucket: String,
        public_base_url: String,
        pool: PgPool,
    ) -> Self {
        Self {
            s3,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            pool,
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, path)
    }
}

#[async_trait]
impl ResumeStorage for S3ResumeStorage {
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(format!("S3 upload failed: {e}")))?;

        info!("Uploaded resume to s3://{}/{}", self.bucket, path);
        Ok(self.public_url(path))
    }

    async fn insert_metadata(
        &self,
        file_name: &str,
        public_url: &str,
    ) -> Result<String, StorageError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO resume_files (id, file_name, upload_time, storage_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(file_name)
        .bind(Utc::now())
        .bind(public_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(id.to_string())
    }
}
