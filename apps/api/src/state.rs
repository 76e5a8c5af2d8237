use std::sync::Arc;

use crate::config::Config;
use crate::inference::TextGenerator;
use crate::storage::blob::ResumeStorage;
use crate::storage::candidates::CandidateStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Immutable after startup; the collaborators are safe for concurrent use.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub candidates: Arc<dyn CandidateStore>,
    pub files: Arc<dyn ResumeStorage>,
    pub generator: Arc<dyn TextGenerator>,
}
