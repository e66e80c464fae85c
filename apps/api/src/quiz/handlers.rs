//! Axum route handlers for the live quiz API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::identity::review::ReviewStep;
use crate::identity::CandidateIdentity;
use crate::models::question::Question;
use crate::quiz::questions::resolve_questions;
use crate::quiz::runner::QuizView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    pub identity: CandidateIdentity,
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

/// POST /api/quiz
///
/// Confirms the reviewed identity and opens a quiz in the not-started state.
/// An invalid identity is rejected with per-field errors.
pub async fn handle_create_quiz(
    State(state): State<AppState>,
    Json(request): Json<CreateQuizRequest>,
) -> Result<Json<QuizView>, AppError> {
    let mut review = ReviewStep::new(Some(request.identity));
    let identity = review.start_quiz().map_err(AppError::InvalidIdentity)?;
    let questions = resolve_questions(request.questions).map_err(AppError::Validation)?;

    let view = state
        .quizzes
        .create(identity, request.resume_text, questions)
        .await;
    Ok(Json(view))
}

/// GET /api/quiz/:id
pub async fn handle_get_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizView>, AppError> {
    Ok(Json(state.quizzes.view(id).await?))
}

/// POST /api/quiz/:id/start
pub async fn handle_start_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizView>, AppError> {
    Ok(Json(state.quizzes.start(id).await?))
}

/// PUT /api/quiz/:id/answer
///
/// Replaces the answer to the question currently displayed.
pub async fn handle_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<QuizView>, AppError> {
    let view = state
        .quizzes
        .apply(id, |runner| runner.set_answer(request.answer).map(|_| None))
        .await?;
    Ok(Json(view))
}

/// POST /api/quiz/:id/next
pub async fn handle_next(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizView>, AppError> {
    let view = state
        .quizzes
        .apply(id, |runner| runner.next().map(|_| None))
        .await?;
    Ok(Json(view))
}

/// POST /api/quiz/:id/previous
pub async fn handle_previous(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizView>, AppError> {
    let view = state
        .quizzes
        .apply(id, |runner| runner.previous().map(|_| None))
        .await?;
    Ok(Json(view))
}

/// POST /api/quiz/:id/advance
///
/// "Next" on every question but the last, where it submits.
pub async fn handle_advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizView>, AppError> {
    let view = state.quizzes.apply(id, |runner| runner.advance()).await?;
    Ok(Json(view))
}

/// POST /api/quiz/:id/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizView>, AppError> {
    Ok(Json(state.quizzes.submit(id).await?))
}
