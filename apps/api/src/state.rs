use std::sync::Arc;

use crate::config::QuizSettings;
use crate::extraction::identity::IdentityExtractor;
use crate::quiz::live::LiveQuizzes;
use crate::sessions::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Session persistence. Default: PgSessionStore.
    pub sessions: Arc<dyn SessionStore>,
    /// Resume contact extraction. Default: LlmIdentityExtractor.
    pub extractor: Arc<dyn IdentityExtractor>,
    /// In-flight quizzes; submissions are written to `sessions`.
    pub quizzes: LiveQuizzes,
}

impl AppState {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        extractor: Arc<dyn IdentityExtractor>,
        quiz: QuizSettings,
    ) -> Self {
        let quizzes = LiveQuizzes::new(Arc::clone(&sessions), quiz);
        Self {
            sessions,
            extractor,
            quizzes,
        }
    }
}
