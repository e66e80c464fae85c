pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::extraction::handlers as extraction;
use crate::identity::handlers as identity;
use crate::quiz::handlers as quiz;
use crate::sessions::handlers as sessions;
use crate::state::AppState;

/// Largest resume upload accepted by `/api/parseResume`.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session persistence
        .route(
            "/api/interviews",
            get(sessions::handle_interviews_get)
                .post(sessions::handle_interviews_post)
                .delete(sessions::handle_interviews_delete),
        )
        // Resume intake
        .route(
            "/api/parseResume",
            post(extraction::handle_parse_resume).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/extractIdentity",
            post(extraction::handle_extract_identity),
        )
        .route(
            "/api/identity/validate",
            post(identity::handle_validate_identity),
        )
        .route("/api/identity/review", post(identity::handle_review_identity))
        // Live quiz
        .route("/api/quiz", post(quiz::handle_create_quiz))
        .route("/api/quiz/:id", get(quiz::handle_get_quiz))
        .route("/api/quiz/:id/start", post(quiz::handle_start_quiz))
        .route("/api/quiz/:id/answer", put(quiz::handle_answer))
        .route("/api/quiz/:id/next", post(quiz::handle_next))
        .route("/api/quiz/:id/previous", post(quiz::handle_previous))
        .route("/api/quiz/:id/advance", post(quiz::handle_advance))
        .route("/api/quiz/:id/submit", post(quiz::handle_submit))
        .with_state(state)
}
