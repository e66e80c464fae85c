use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::session::{InterviewSession, NewSession, SessionStats, SessionUpdate};

/// Maximum rows returned by a name/email search.
pub const SEARCH_LIMIT: i64 = 50;
/// Number of sessions listed in the stats summary.
pub const RECENT_SESSIONS_LIMIT: i64 = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(e.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Durable record of interview sessions. The only writer of sessions.
///
/// Every list is ordered newest first. Carried in `AppState` as
/// `Arc<dyn SessionStore>`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a new session in one write and returns its id. Not idempotent:
    /// every call creates a record.
    async fn save(&self, session: NewSession) -> Result<Uuid, StoreError>;

    /// Replaces answers, time spent and completion time. Returns `false`
    /// when no session has the given id.
    async fn update_answers(&self, update: SessionUpdate) -> Result<bool, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<InterviewSession>, StoreError>;

    /// Exact-match lookup by email.
    async fn for_user(&self, email: &str) -> Result<Vec<InterviewSession>, StoreError>;

    /// Sessions created within `[start, end]`.
    async fn in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InterviewSession>, StoreError>;

    /// Case-insensitive substring match on name or email, capped at [`SEARCH_LIMIT`].
    async fn search(&self, term: &str) -> Result<Vec<InterviewSession>, StoreError>;

    async fn stats(&self) -> Result<SessionStats, StoreError>;

    /// Hard delete. Deleting an unknown id is not an error.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn save(&self, session: NewSession) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO interview_sessions
                (id, user_name, user_email, user_mobile, resume_text,
                 questions, answers, time_spent, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(&session.user_data.name)
        .bind(&session.user_data.email)
        .bind(&session.user_data.mobile)
        .bind(&session.resume_text)
        .bind(Json(&session.questions))
        .bind(Json(&session.answers))
        .bind(session.time_spent)
        .bind(session.completed_at)
        .execute(&self.pool)
        .await?;

        info!("Interview session saved with ID: {id}");
        Ok(id)
    }

    async fn update_answers(&self, update: SessionUpdate) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE interview_sessions
            SET answers = $1, time_spent = $2, completed_at = $3
            WHERE id = $4
            "#,
        )
        .bind(Json(&update.answers))
        .bind(update.time_spent)
        .bind(update.completed_at)
        .bind(update.session_id)
        .execute(&self.pool)
        .await?;

        let found = result.rows_affected() > 0;
        if found {
            info!("Interview answers updated for session: {}", update.session_id);
        }
        Ok(found)
    }

    async fn get(&self, id: Uuid) -> Result<Option<InterviewSession>, StoreError> {
        let session = sqlx::query_as::<_, InterviewSession>(
            "SELECT * FROM interview_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn for_user(&self, email: &str) -> Result<Vec<InterviewSession>, StoreError> {
        let sessions = sqlx::query_as::<_, InterviewSession>(
            "SELECT * FROM interview_sessions WHERE user_email = $1 ORDER BY created_at DESC",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InterviewSession>, StoreError> {
        let sessions = sqlx::query_as::<_, InterviewSession>(
            r#"
            SELECT * FROM interview_sessions
            WHERE created_at BETWEEN $1 AND $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn search(&self, term: &str) -> Result<Vec<InterviewSession>, StoreError> {
        let pattern = format!("%{}%", escape_like(term));

        let sessions = sqlx::query_as::<_, InterviewSession>(
            r#"
            SELECT * FROM interview_sessions
            WHERE user_name ILIKE $1 OR user_email ILIKE $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn stats(&self) -> Result<SessionStats, StoreError> {
        let (total_sessions, total_users, average_time_spent, recent_sessions) = tokio::try_join!(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM interview_sessions")
                .fetch_one(&self.pool),
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(DISTINCT user_email) FROM interview_sessions"
            )
            .fetch_one(&self.pool),
            sqlx::query_scalar::<_, Option<f64>>(
                "SELECT AVG(time_spent)::float8 FROM interview_sessions WHERE time_spent IS NOT NULL"
            )
            .fetch_one(&self.pool),
            sqlx::query_as::<_, InterviewSession>(
                "SELECT * FROM interview_sessions ORDER BY created_at DESC LIMIT $1"
            )
            .bind(RECENT_SESSIONS_LIMIT)
            .fetch_all(&self.pool),
        )?;

        Ok(SessionStats {
            total_sessions,
            total_users,
            average_time_spent: average_time_spent.unwrap_or(0.0),
            recent_sessions,
        })
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM interview_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!("Interview session deleted: {id}");
        Ok(())
    }
}

/// Escapes LIKE wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
