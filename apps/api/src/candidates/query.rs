//! Candidate query orchestrator: lookups and question answering.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::inference::qa::answer_question;
use crate::models::candidate::CandidateSummary;
use crate::state::AppState;
use crate::storage::candidates::{CandidateStore, StoredCandidate};

pub const CANDIDATE_NOT_FOUND: &str = "Candidate not found";

#[derive(Debug, Serialize)]
pub struct CandidateList {
    pub count: usize,
    pub candidates: Vec<CandidateSummary>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub question: String,
    pub answer: String,
}

/// Finds a candidate by `candidate_id`, falling back to the store's internal id.
pub async fn lookup(
    store: &dyn CandidateStore,
    candidate_id: &str,
) -> Result<StoredCandidate, AppError> {
    if let Some(found) = store.find_one("candidate_id", candidate_id).await? {
        return Ok(found);
    }

    // Uuid parsing is case-insensitive, so the fallback key is too.
    if let Ok(id) = Uuid::parse_str(candidate_id.trim()) {
        if let Some(found) = store.find_by_id(id).await? {
            return Ok(found);
        }
    }

    Err(AppError::NotFound(CANDIDATE_NOT_FOUND.to_string()))
}

pub async fn list(store: &dyn CandidateStore) -> Result<CandidateList, AppError> {
    let candidates = store.list_summaries().await?;
    Ok(CandidateList {
        count: candidates.len(),
        candidates,
    })
}

/// Answers `question` using only the candidate's structured fields as context.
pub async fn answer(
    state: &AppState,
    candidate_id: &str,
    question: &str,
) -> Result<AnswerResponse, AppError> {
    let candidate = lookup(state.candidates.as_ref(), candidate_id).await?;
    if question.trim().is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    let context_json = candidate.record.question_context().to_string();

    let answer = answer_question(
        state.generator.as_ref(),
        &state.config.qa_model,
        question,
        &context_json,
    )
    .await?;
    info!("Answered question about candidate {}", candidate.record.candidate_id);

    Ok(AnswerResponse {
        question: question.to_string(),
        answer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_record, InMemoryCandidateStore};

    #[tokio::test]
    async fn test_lookup_by_candidate_id() {
        let store = InMemoryCandidateStore::default();
        let id = store.insert(&sample_record("meta-1")).await.unwrap();

        let found = lookup(&store, "meta-1").await.unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.record.candidate_id, "meta-1");
    }

    #[tokio::test]
    async fn test_lookup_falls_back_to_internal_id() {
        let store = InMemoryCandidateStore::default();
        let id = store.insert(&sample_record("meta-1")).await.unwrap();

        let found = lookup(&store, &id.to_uppercase()).await.unwrap();
        assert_eq!(found.record.candidate_id, "meta-1");
    }

    #[tokio::test]
    async fn test_lookup_missing_is_not_found() {
        let store = InMemoryCandidateStore::default();
        store.insert(&sample_record("meta-1")).await.unwrap();

        for missing in ["meta-2", "00000000-0000-0000-0000-000000000000", ""] {
            let err = lookup(&store, missing).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(ref msg) if msg == CANDIDATE_NOT_FOUND));
        }
    }

    #[tokio::test]
    async fn test_list_counts_candidates() {
        let store = InMemoryCandidateStore::default();
        store.insert(&sample_record("a")).await.unwrap();
        store.insert(&sample_record("b")).await.unwrap();

        let listing = list(&store).await.unwrap();
        assert_eq!(listing.count, 2);
        let ids: Vec<_> = listing.candidates.iter().map(|c| c.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
