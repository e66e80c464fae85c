use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::session::{InterviewSession, NewSession, SessionStats, SessionUpdate};
use crate::sessions::store::{SessionStore, StoreError, RECENT_SESSIONS_LIMIT, SEARCH_LIMIT};

/// In-process store with the same ordering and limits as the Postgres one.
#[derive(Default)]
pub(crate) struct MemorySessionStore {
    pub(crate) sessions: RwLock<Vec<InterviewSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts with an explicit creation time so ordering can be pinned.
    pub fn insert_at(&self, session: NewSession, created_at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.write().unwrap().push(InterviewSession {
            id,
            user_name: session.user_data.name,
            user_email: session.user_data.email,
            user_mobile: session.user_data.mobile,
            resume_text: Some(session.resume_text),
            questions: Json(session.questions),
            answers: Json(session.answers),
            time_spent: session.time_spent,
            completed_at: session.completed_at,
            created_at,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    fn newest_first<F>(&self, keep: F) -> Vec<InterviewSession>
    where
        F: Fn(&InterviewSession) -> bool,
    {
        let mut found: Vec<_> = self
            .sessions
            .read()
            .unwrap()
            .iter()
            .filter(|s| keep(s))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, session: NewSession) -> Result<Uuid, StoreError> {
        Ok(self.insert_at(session, Utc::now()))
    }

    async fn update_answers(&self, update: SessionUpdate) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().unwrap();
        match sessions.iter_mut().find(|s| s.id == update.session_id) {
            Some(session) => {
                session.answers = Json(update.answers);
                session.time_spent = Some(update.time_spent);
                session.completed_at = update.completed_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<InterviewSession>, StoreError> {
        Ok(self
            .sessions
            .read()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn for_user(&self, email: &str) -> Result<Vec<InterviewSession>, StoreError> {
        Ok(self.newest_first(|s| s.user_email == email))
    }

    async fn in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InterviewSession>, StoreError> {
        Ok(self.newest_first(|s| s.created_at >= start && s.created_at <= end))
    }

    async fn search(&self, term: &str) -> Result<Vec<InterviewSession>, StoreError> {
        let needle = term.to_lowercase();
        let mut found = self.newest_first(|s| {
            s.user_name.to_lowercase().contains(&needle)
                || s.user_email.to_lowercase().contains(&needle)
        });
        found.truncate(SEARCH_LIMIT as usize);
        Ok(found)
    }

    async fn stats(&self) -> Result<SessionStats, StoreError> {
        let mut recent_sessions = self.newest_first(|_| true);
        let sessions = self.sessions.read().unwrap();

        let total_users = sessions
            .iter()
            .map(|s| s.user_email.as_str())
            .collect::<HashSet<_>>()
            .len();
        let timed: Vec<i32> = sessions.iter().filter_map(|s| s.time_spent).collect();
        let average_time_spent = if timed.is_empty() {
            0.0
        } else {
            timed.iter().map(|&t| f64::from(t)).sum::<f64>() / timed.len() as f64
        };

        recent_sessions.truncate(RECENT_SESSIONS_LIMIT as usize);
        Ok(SessionStats {
            total_sessions: sessions.len() as i64,
            total_users: total_users as i64,
            average_time_spent,
            recent_sessions,
        })
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.sessions.write().unwrap().retain(|s| s.id != id);
        Ok(())
    }
}

/// Store whose every operation fails, for exercising error paths.
pub(crate) struct FailingSessionStore;

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn save(&self, _session: NewSession) -> Result<Uuid, StoreError> {
        Err(unavailable())
    }

    async fn update_answers(&self, _update: SessionUpdate) -> Result<bool, StoreError> {
        Err(unavailable())
    }

    async fn get(&self, _id: Uuid) -> Result<Option<InterviewSession>, StoreError> {
        Err(unavailable())
    }

    async fn for_user(&self, _email: &str) -> Result<Vec<InterviewSession>, StoreError> {
        Err(unavailable())
    }

    async fn in_range(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<InterviewSession>, StoreError> {
        Err(unavailable())
    }

    async fn search(&self, _term: &str) -> Result<Vec<InterviewSession>, StoreError> {
        Err(unavailable())
    }

    async fn stats(&self) -> Result<SessionStats, StoreError> {
        Err(unavailable())
    }

    async fn delete(&self, _id: Uuid) -> Result<(), StoreError> {
        Err(unavailable())
    }
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::identity::CandidateIdentity;

    fn new_session(name: &str, email: &str, time_spent: Option<i32>) -> NewSession {
        NewSession {
            user_data: CandidateIdentity::new(name, email, "5551234567"),
            resume_text: String::new(),
            questions: vec![],
            answers: Default::default(),
            time_spent,
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_on_name_or_email() {
        let store = MemorySessionStore::new();
        let now = Utc::now();
        let old = store.insert_at(new_session("Jane Doe", "jd@example.com", None), now - Duration::hours(2));
        let new = store.insert_at(new_session("Bob", "JANE.r@example.com", None), now);
        store.insert_at(new_session("Alice", "alice@example.com", None), now);

        let found = store.search("jane").await.unwrap();
        let ids: Vec<_> = found.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![new, old]);
    }

    #[tokio::test]
    async fn test_search_capped() {
        let store = MemorySessionStore::new();
        let now = Utc::now();
        for i in 0..60 {
            store.insert_at(
                new_session("Jane", &format!("jane{i}@example.com"), None),
                now - Duration::seconds(i),
            );
        }
        let found = store.search("JANE").await.unwrap();
        assert_eq!(found.len(), SEARCH_LIMIT as usize);
        assert!(found.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_stats_counts_distinct_emails_and_averages_recorded_times() {
        let store = MemorySessionStore::new();
        store.save(new_session("Jane", "jane@example.com", Some(100))).await.unwrap();
        store.save(new_session("Jane", "jane@example.com", Some(200))).await.unwrap();
        store.save(new_session("Bob", "bob@example.com", None)).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.total_users, 2);
        assert!((stats.average_time_spent - 150.0).abs() < f64::EPSILON);
        assert_eq!(stats.recent_sessions.len(), 3);
    }

    #[tokio::test]
    async fn test_stats_empty_store() {
        let stats = MemorySessionStore::new().stats().await.unwrap();
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.average_time_spent, 0.0);
        assert!(stats.recent_sessions.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_session_reports_missing() {
        let store = MemorySessionStore::new();
        let update = SessionUpdate {
            session_id: Uuid::new_v4(),
            answers: Default::default(),
            time_spent: 10,
            completed_at: None,
        };
        assert!(!store.update_answers(update).await.unwrap());
    }

    #[tokio::test]
    async fn test_range_is_inclusive() {
        let store = MemorySessionStore::new();
        let start = Utc::now() - Duration::days(7);
        let end = Utc::now();
        let inside = store.insert_at(new_session("A", "a@example.com", None), start);
        store.insert_at(new_session("B", "b@example.com", None), start - Duration::seconds(1));

        let found = store.in_range(start, end).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, inside);
    }
}
