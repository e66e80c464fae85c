use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::identity::CandidateIdentity;
use crate::models::question::{Answers, Question};

/// One persisted interview attempt, returned with its column names.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewSession {
    pub id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub user_mobile: String,
    pub resume_text: Option<String>,
    pub questions: Json<Vec<Question>>,
    pub answers: Json<Answers>,
    pub time_spent: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to create a session in one write.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub user_data: CandidateIdentity,
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub answers: Answers,
    pub time_spent: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// The single post-creation patch a session may receive.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub session_id: Uuid,
    #[serde(default)]
    pub answers: Answers,
    pub time_spent: i32,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_sessions: i64,
    /// Distinct candidates, counted by email.
    pub total_users: i64,
    /// Mean `time_spent` over sessions that recorded one; 0 when none did.
    pub average_time_spent: f64,
    pub recent_sessions: Vec<InterviewSession>,
}
