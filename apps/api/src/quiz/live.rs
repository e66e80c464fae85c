//! Registry of in-flight quizzes and the countdown that drives each one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::{self, Instant};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::QuizSettings;
use crate::errors::AppError;
use crate::identity::ConfirmedIdentity;
use crate::models::question::Question;
use crate::quiz::runner::{QuizError, QuizRunner, QuizStatus, QuizView, Submission, Tick};
use crate::sessions::store::SessionStore;

const TICK: Duration = Duration::from_secs(1);

type SharedRunner = Arc<Mutex<QuizRunner>>;

/// Live quizzes keyed by id. Each runner is owned by exactly one entry and
/// mutated under its own lock; the countdown task is the only other holder.
#[derive(Clone)]
pub struct LiveQuizzes {
    quizzes: Arc<RwLock<HashMap<Uuid, SharedRunner>>>,
    store: Arc<dyn SessionStore>,
    settings: QuizSettings,
}

impl LiveQuizzes {
    pub fn new(store: Arc<dyn SessionStore>, settings: QuizSettings) -> Self {
        Self {
            quizzes: Arc::new(RwLock::new(HashMap::new())),
            store,
            settings,
        }
    }

    /// Registers a not-started quiz. If it is still not started once a full
    /// countdown plus the completion delay has passed, it is dropped.
    pub async fn create(
        &self,
        identity: ConfirmedIdentity,
        resume_text: String,
        questions: Vec<Question>,
    ) -> QuizView {
        let id = Uuid::new_v4();
        let email = identity.email().to_string();
        let runner = QuizRunner::new(identity, resume_text, questions, self.settings.duration_secs);
        let view = runner.view(id);

        self.quizzes
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(runner)));

        info!(
            "Quiz {id} created for {email} ({} questions)",
            view.total_questions
        );
        self.spawn_idle_expiry(id);
        view
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.quizzes.read().await.len()
    }

    async fn runner(&self, id: Uuid) -> Result<SharedRunner, AppError> {
        self.quizzes
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Quiz {id} not found")))
    }

    pub async fn view(&self, id: Uuid) -> Result<QuizView, AppError> {
        let runner = self.runner(id).await?;
        let view = runner.lock().await.view(id);
        Ok(view)
    }

    /// Starts the countdown. A second start is rejected.
    pub async fn start(&self, id: Uuid) -> Result<QuizView, AppError> {
        let runner = self.runner(id).await?;
        let view = {
            let mut guard = runner.lock().await;
            guard.start().map_err(conflict)?;
            guard.view(id)
        };

        self.spawn_countdown(id, runner);
        info!("Quiz {id} started ({}s)", self.settings.duration_secs);
        Ok(view)
    }

    /// Applies one candidate action. If the action submits the quiz, the
    /// submission is persisted in the background.
    pub async fn apply<F>(&self, id: Uuid, action: F) -> Result<QuizView, AppError>
    where
        F: FnOnce(&mut QuizRunner) -> Result<Option<Submission>, QuizError>,
    {
        let runner = self.runner(id).await?;
        let mut guard = runner.lock().await;

        if let Some(submission) = action(&mut *guard).map_err(conflict)? {
            info!(
                "Quiz {id} submitted ({:?}) after {}s",
                submission.reason, submission.time_spent
            );
            self.complete(id, submission);
        }
        Ok(guard.view(id))
    }

    /// Submits the quiz. Submitting an already-submitted quiz is a no-op.
    pub async fn submit(&self, id: Uuid) -> Result<QuizView, AppError> {
        self.apply(id, |runner| match runner.submit() {
            Ok(submission) => Ok(Some(submission)),
            Err(QuizError::AlreadySubmitted) => Ok(None),
            Err(e) => Err(e),
        })
        .await
    }

    fn spawn_countdown(&self, id: Uuid, runner: SharedRunner) {
        let live = self.clone();
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
            loop {
                ticker.tick().await;
                let outcome = runner.lock().await.tick();
                match outcome {
                    Tick::Running { remaining } => {
                        if remaining % 60 == 0 {
                            debug!("Quiz {id}: {remaining}s remaining");
                        }
                    }
                    Tick::Expired(submission) => {
                        info!(
                            "Quiz {id} submitted ({:?}) after {}s",
                            submission.reason, submission.time_spent
                        );
                        live.complete(id, submission);
                        break;
                    }
                    Tick::Idle => break,
                }
            }
            debug!("Countdown for quiz {id} stopped");
        });
    }

    fn spawn_idle_expiry(&self, id: Uuid) {
        let quizzes = Arc::clone(&self.quizzes);
        let ttl = Duration::from_secs(u64::from(self.settings.duration_secs))
            + self.settings.completion_delay;
        tokio::spawn(async move {
            time::sleep(ttl).await;
            let mut quizzes = quizzes.write().await;
            let unstarted = match quizzes.get(&id) {
                Some(runner) => runner.lock().await.status() == QuizStatus::NotStarted,
                None => false,
            };
            if unstarted {
                quizzes.remove(&id);
                info!("Quiz {id} never started; released after {ttl:?}");
            }
        });
    }

    /// Fire-and-forget persistence followed by the completion callback.
    ///
    /// A failed save is logged and otherwise ignored: the quiz stays
    /// submitted either way.
    fn complete(&self, id: Uuid, submission: Submission) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match store.save(submission.into_new_session()).await {
                Ok(session_id) => info!("Quiz {id} persisted as session {session_id}"),
                Err(e) => error!("Failed to persist quiz {id}: {e}"),
            }
        });

        let quizzes = Arc::clone(&self.quizzes);
        let delay = self.settings.completion_delay;
        tokio::spawn(async move {
            time::sleep(delay).await;
            quizzes.write().await.remove(&id);
            debug!("Quiz {id} completed and released");
        });
    }
}

fn conflict(err: QuizError) -> AppError {
    AppError::Conflict(err.to_string())
}
