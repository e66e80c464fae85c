//! Axum route handlers for `/api/interviews`.
//!
//! One resource path, dispatched on an `action` field: POST reads it from
//! the JSON body, GET from the query string. Unknown actions are a 400.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::session::{InterviewSession, NewSession, SessionStats, SessionUpdate};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub search_term: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewQuery {
    pub action: Option<String>,
    pub session_id: Option<String>,
    pub email: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub success: bool,
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: Option<InterviewSession>,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub success: bool,
    pub sessions: Vec<InterviewSession>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: SessionStats,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/interviews  (action = save | update | search)
pub async fn handle_interviews_post(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) =
        body.map_err(|e| AppError::Validation(format!("Invalid request body: {}", e.body_text())))?;
    let action = body
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match action.as_str() {
        "save" => {
            let session: NewSession = parse_body(body)?;
            if session.time_spent.is_some_and(|t| t < 0) {
                return Err(AppError::Validation("timeSpent cannot be negative".to_string()));
            }
            let session_id = state.sessions.save(session).await?;
            Ok(Json(SaveResponse {
                success: true,
                session_id,
            })
            .into_response())
        }
        "update" => {
            let update: SessionUpdate = parse_body(body)?;
            if update.time_spent < 0 {
                return Err(AppError::Validation("timeSpent cannot be negative".to_string()));
            }
            let session_id = update.session_id;
            if !state.sessions.update_answers(update).await? {
                return Err(AppError::NotFound(format!("Session {session_id} not found")));
            }
            Ok(Json(SuccessResponse { success: true }).into_response())
        }
        "search" => {
            let request: SearchRequest = parse_body(body)?;
            let sessions = state.sessions.search(&request.search_term).await?;
            Ok(Json(SessionsResponse {
                success: true,
                sessions,
            })
            .into_response())
        }
        _ => Err(AppError::Validation("Invalid action".to_string())),
    }
}

/// GET /api/interviews?action=get|getUserSessions|stats|range
pub async fn handle_interviews_get(
    State(state): State<AppState>,
    Query(query): Query<InterviewQuery>,
) -> Result<Response, AppError> {
    match query.action.as_deref().unwrap_or_default() {
        "get" => {
            let id = require_session_id(query.session_id.as_deref())?;
            let session = state.sessions.get(id).await?;
            Ok(Json(SessionResponse {
                success: true,
                session,
            })
            .into_response())
        }
        "getUserSessions" => {
            let email = query
                .email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .ok_or_else(|| AppError::Validation("Email required".to_string()))?;
            let sessions = state.sessions.for_user(email).await?;
            Ok(Json(SessionsResponse {
                success: true,
                sessions,
            })
            .into_response())
        }
        "stats" => {
            let stats = state.sessions.stats().await?;
            Ok(Json(StatsResponse {
                success: true,
                stats,
            })
            .into_response())
        }
        "range" => {
            let start = parse_timestamp("start", query.start.as_deref())?;
            let end = parse_timestamp("end", query.end.as_deref())?;
            if end < start {
                return Err(AppError::Validation("end must not be before start".to_string()));
            }
            let sessions = state.sessions.in_range(start, end).await?;
            Ok(Json(SessionsResponse {
                success: true,
                sessions,
            })
            .into_response())
        }
        _ => Err(AppError::Validation("Invalid action".to_string())),
    }
}

/// DELETE /api/interviews?sessionId=...
pub async fn handle_interviews_delete(
    State(state): State<AppState>,
    Query(query): Query<InterviewQuery>,
) -> Result<Json<SuccessResponse>, AppError> {
    let id = require_session_id(query.session_id.as_deref())?;
    state.sessions.delete(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}

fn require_session_id(raw: Option<&str>) -> Result<Uuid, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Session ID required".to_string()))?;
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid session ID: {raw}")))
}

fn parse_timestamp(name: &str, raw: Option<&str>) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.ok_or_else(|| AppError::Validation(format!("{name} required")))?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| AppError::Validation(format!("{name} must be an RFC 3339 timestamp")))
}
