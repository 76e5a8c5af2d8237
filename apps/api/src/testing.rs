//! In-memory collaborators for unit and router tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::config::test_config;
use crate::inference::{InferenceError, TextGenerator};
use crate::models::candidate::{
    CandidateRecord, CandidateSummary, ExtractedProfile, FileMetadata,
};
use crate::state::AppState;
use crate::storage::blob::ResumeStorage;
use crate::storage::candidates::{CandidateStore, StoredCandidate};
use crate::storage::StorageError;

/// Replays queued responses in order and records every call.
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<Value, InferenceError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, envelope: Value) {
        self.responses.lock().unwrap().push_back(Ok(envelope));
    }

    pub fn push_api_error(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(Err(InferenceError::Api {
            status,
            body: body.to_string(),
        }));
    }

    /// `(model, prompt)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Value, InferenceError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(InferenceError::Api {
                    status: 500,
                    body: "no scripted response".to_string(),
                })
            })
    }
}

#[derive(Default)]
pub struct InMemoryResumeStorage {
    fail_uploads: bool,
    objects: Mutex<Vec<(String, Vec<u8>)>>,
    metadata: Mutex<Vec<(String, String, String)>>,
}

impl InMemoryResumeStorage {
    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn objects(&self) -> Vec<(String, Vec<u8>)> {
        self.objects.lock().unwrap().clone()
    }

    /// `(id, file_name, public_url)` rows in insertion order.
    pub fn metadata(&self) -> Vec<(String, String, String)> {
        self.metadata.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResumeStorage for InMemoryResumeStorage {
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        if self.fail_uploads {
            return Err(StorageError::Upload("bucket unavailable".to_string()));
        }
        self.objects.lock().unwrap().push((path.to_string(), bytes));
        Ok(format!("http://localhost:9000/resumes/{path}"))
    }

    async fn insert_metadata(
        &self,
        file_name: &str,
        public_url: &str,
    ) -> Result<String, StorageError> {
        let id = Uuid::new_v4().to_string();
        self.metadata.lock().unwrap().push((
            id.clone(),
            file_name.to_string(),
            public_url.to_string(),
        ));
        Ok(id)
    }
}

#[derive(Default)]
pub struct InMemoryCandidateStore {
    records: Mutex<Vec<StoredCandidate>>,
}

impl InMemoryCandidateStore {
    pub fn records(&self) -> Vec<StoredCandidate> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandidateStore for InMemoryCandidateStore {
    async fn insert(&self, record: &CandidateRecord) -> Result<String, StorageError> {
        let id = Uuid::new_v4().to_string();
        self.records.lock().unwrap().push(StoredCandidate {
            id: id.clone(),
            record: record.clone(),
        });
        Ok(id)
    }

    async fn find_one(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<StoredCandidate>, StorageError> {
        let records = self.records.lock().unwrap();
        for stored in records.iter() {
            let document = serde_json::to_value(&stored.record)?;
            if document.get(field).and_then(Value::as_str) == Some(value) {
                return Ok(Some(stored.clone()));
            }
        }
        Ok(None)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredCandidate>, StorageError> {
        let id = id.to_string();
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|stored| stored.id == id)
            .cloned())
    }

    async fn list_summaries(&self) -> Result<Vec<CandidateSummary>, StorageError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|stored| CandidateSummary {
                id: stored.id.clone(),
                candidate_id: stored.record.candidate_id.clone(),
                introduction: stored.record.introduction.clone(),
                skills: stored.record.skills.clone(),
                created_at: stored.record.created_at,
            })
            .collect())
    }
}

pub fn sample_record(candidate_id: &str) -> CandidateRecord {
    CandidateRecord::new(
        candidate_id.to_string(),
        ExtractedProfile {
            introduction: "Backend engineer.".to_string(),
            skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            hobbies: vec!["climbing".to_string()],
            ..ExtractedProfile::default()
        },
        "raw resume text".to_string(),
        FileMetadata {
            file_name: "cv.pdf".to_string(),
            public_url: format!("http://localhost:9000/resumes/{candidate_id}.pdf"),
            uploaded_at: Utc::now(),
        },
    )
}

/// Fakes wired into an [`AppState`], kept reachable for assertions.
pub struct TestHarness {
    pub generator: Arc<ScriptedGenerator>,
    pub files: Arc<InMemoryResumeStorage>,
    pub candidates: Arc<InMemoryCandidateStore>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_files(InMemoryResumeStorage::default())
    }

    pub fn with_failing_uploads() -> Self {
        Self::with_files(InMemoryResumeStorage::failing_uploads())
    }

    fn with_files(files: InMemoryResumeStorage) -> Self {
        Self {
            generator: Arc::new(ScriptedGenerator::new()),
            files: Arc::new(files),
            candidates: Arc::new(InMemoryCandidateStore::default()),
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            config: Arc::new(test_config()),
            candidates: self.candidates.clone(),
            files: self.files.clone(),
            generator: self.generator.clone(),
        }
    }
}
