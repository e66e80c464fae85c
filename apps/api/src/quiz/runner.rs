//! Quiz runner state machine.
//!
//! `NotStarted -> InProgress -> Submitted`. The runner owns the answer set
//! and the countdown; it is driven one tick per second by the caller and
//! hands out exactly one [`Submission`] over its lifetime.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::identity::ConfirmedIdentity;
use crate::models::question::{Answers, Question};
use crate::models::session::NewSession;
use crate::quiz::questions::default_questions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    NotStarted,
    InProgress,
    Submitted,
}

/// What the forward button does on the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdvanceAction {
    Next,
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    Manual,
    TimeExpired,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("Quiz has not started")]
    NotStarted,

    #[error("Quiz already started")]
    AlreadyStarted,

    #[error("Quiz already submitted")]
    AlreadySubmitted,
}

/// Immutable snapshot handed to the session store on submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub identity: ConfirmedIdentity,
    pub resume_text: String,
    pub questions: Vec<Question>,
    /// One entry per question id; unanswered questions map to "".
    pub answers: Answers,
    pub time_spent: u32,
    pub completed_at: DateTime<Utc>,
    pub reason: SubmitReason,
}

impl Submission {
    pub fn into_new_session(self) -> NewSession {
        NewSession {
            user_data: self.identity.as_identity().clone(),
            resume_text: self.resume_text,
            questions: self.questions,
            answers: self.answers,
            time_spent: Some(i32::try_from(self.time_spent).unwrap_or(i32::MAX)),
            completed_at: Some(self.completed_at),
        }
    }
}

/// Result of one countdown tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    Running { remaining: u32 },
    Expired(Submission),
    /// The runner is not in progress; the driver should stop.
    Idle,
}

#[derive(Debug, Clone)]
pub struct QuizRunner {
    identity: ConfirmedIdentity,
    resume_text: String,
    questions: Vec<Question>,
    answers: Answers,
    current: usize,
    total_secs: u32,
    remaining_secs: u32,
    status: QuizStatus,
}

/// Client-facing rendering of a runner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub quiz_id: Uuid,
    pub status: QuizStatus,
    pub candidate: ConfirmedIdentity,
    pub question_number: usize,
    pub total_questions: usize,
    pub question: Question,
    pub answer: String,
    pub remaining_seconds: u32,
    pub timer: String,
    pub answer_editable: bool,
    pub can_go_previous: bool,
    pub advance_label: Option<AdvanceAction>,
}

impl QuizRunner {
    /// Creates a runner with the countdown frozen at `total_secs`. An empty
    /// question list is replaced by the built-in defaults.
    pub fn new(
        identity: ConfirmedIdentity,
        resume_text: String,
        questions: Vec<Question>,
        total_secs: u32,
    ) -> Self {
        let questions = if questions.is_empty() {
            default_questions()
        } else {
            questions
        };

        Self {
            identity,
            resume_text,
            questions,
            answers: Answers::new(),
            current: 0,
            total_secs,
            remaining_secs: total_secs,
            status: QuizStatus::NotStarted,
        }
    }

    pub fn status(&self) -> QuizStatus {
        self.status
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answer_for(&self, question_id: u32) -> &str {
        self.answers
            .get(&question_id)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Elapsed countdown, clamped to `[0, total]`.
    pub fn time_spent(&self) -> u32 {
        self.total_secs
            .saturating_sub(self.remaining_secs)
            .min(self.total_secs)
    }

    fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    fn require_in_progress(&self) -> Result<(), QuizError> {
        match self.status {
            QuizStatus::NotStarted => Err(QuizError::NotStarted),
            QuizStatus::InProgress => Ok(()),
            QuizStatus::Submitted => Err(QuizError::AlreadySubmitted),
        }
    }

    pub fn start(&mut self) -> Result<(), QuizError> {
        match self.status {
            QuizStatus::NotStarted => {
                self.status = QuizStatus::InProgress;
                Ok(())
            }
            QuizStatus::InProgress => Err(QuizError::AlreadyStarted),
            QuizStatus::Submitted => Err(QuizError::AlreadySubmitted),
        }
    }

    /// Advances the countdown by one second. Reaching zero submits exactly
    /// as a manual submit on the last question would.
    pub fn tick(&mut self) -> Tick {
        if self.status != QuizStatus::InProgress {
            return Tick::Idle;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            Tick::Expired(self.finish(SubmitReason::TimeExpired))
        } else {
            Tick::Running {
                remaining: self.remaining_secs,
            }
        }
    }

    /// Replaces the answer for the displayed question only.
    pub fn set_answer(&mut self, text: impl Into<String>) -> Result<(), QuizError> {
        self.require_in_progress()?;
        let id = self.current_question().id;
        self.answers.insert(id, text.into());
        Ok(())
    }

    pub fn next(&mut self) -> Result<(), QuizError> {
        self.require_in_progress()?;
        if !self.is_last() {
            self.current += 1;
        }
        Ok(())
    }

    pub fn previous(&mut self) -> Result<(), QuizError> {
        self.require_in_progress()?;
        self.current = self.current.saturating_sub(1);
        Ok(())
    }

    pub fn advance_action(&self) -> Option<AdvanceAction> {
        if self.status != QuizStatus::InProgress {
            return None;
        }
        Some(if self.is_last() {
            AdvanceAction::Submit
        } else {
            AdvanceAction::Next
        })
    }

    /// "Next" on any question but the last; "Submit" on the last.
    pub fn advance(&mut self) -> Result<Option<Submission>, QuizError> {
        match self.advance_action() {
            Some(AdvanceAction::Next) => self.next().map(|_| None),
            Some(AdvanceAction::Submit) => self.submit().map(Some),
            None => self.require_in_progress().map(|_| None),
        }
    }

    pub fn submit(&mut self) -> Result<Submission, QuizError> {
        self.require_in_progress()?;
        Ok(self.finish(SubmitReason::Manual))
    }

    fn finish(&mut self, reason: SubmitReason) -> Submission {
        self.status = QuizStatus::Submitted;

        let answers = self
            .questions
            .iter()
            .map(|q| (q.id, self.answer_for(q.id).to_string()))
            .collect();

        Submission {
            identity: self.identity.clone(),
            resume_text: self.resume_text.clone(),
            questions: self.questions.clone(),
            answers,
            time_spent: self.time_spent(),
            completed_at: Utc::now(),
            reason,
        }
    }

    pub fn view(&self, quiz_id: Uuid) -> QuizView {
        let question = self.current_question().clone();
        QuizView {
            quiz_id,
            status: self.status(),
            candidate: self.identity.clone(),
            question_number: self.current_index() + 1,
            total_questions: self.questions().len(),
            answer: self.answer_for(question.id).to_string(),
            question,
            remaining_seconds: self.remaining_secs(),
            timer: format_time(self.remaining_secs()),
            answer_editable: self.status == QuizStatus::InProgress,
            can_go_previous: self.status == QuizStatus::InProgress && self.current > 0,
            advance_label: self.advance_action(),
        }
    }
}

/// Formats seconds as zero-padded `MM:SS`.
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::CandidateIdentity;

    fn identity() -> ConfirmedIdentity {
        ConfirmedIdentity::try_from(CandidateIdentity::new(
            "Jane Doe",
            "jane@example.com",
            "+1 (555) 123-4567",
        ))
        .unwrap()
    }

    fn runner(total: u32) -> QuizRunner {
        QuizRunner::new(identity(), "resume".into(), vec![], total)
    }

    #[test]
    fn test_not_started_is_frozen() {
        let mut quiz = runner(10);
        assert_eq!(quiz.status(), QuizStatus::NotStarted);
        assert_eq!(quiz.tick(), Tick::Idle);
        assert_eq!(quiz.remaining_secs(), 10);
        assert_eq!(quiz.set_answer("x"), Err(QuizError::NotStarted));
        assert_eq!(quiz.next(), Err(QuizError::NotStarted));
        assert!(quiz.advance_action().is_none());

        let view = quiz.view(Uuid::nil());
        assert_eq!(view.question_number, 1);
        assert_eq!(view.total_questions, 3);
        assert!(!view.answer_editable);
        assert_eq!(view.timer, "00:10");
    }

    #[test]
    fn test_empty_question_list_uses_defaults() {
        assert_eq!(runner(10).questions(), default_questions().as_slice());
    }

    #[test]
    fn test_countdown_expires_exactly_once_with_full_time() {
        let mut quiz = runner(5);
        quiz.start().unwrap();
        for expected in (1..5).rev() {
            assert_eq!(quiz.tick(), Tick::Running { remaining: expected });
        }
        let submission = match quiz.tick() {
            Tick::Expired(s) => s,
            other => panic!("expected expiry, got {other:?}"),
        };
        assert_eq!(submission.time_spent, 5);
        assert_eq!(submission.reason, SubmitReason::TimeExpired);
        assert_eq!(quiz.status(), QuizStatus::Submitted);
        assert_eq!(quiz.tick(), Tick::Idle);
        assert_eq!(quiz.submit(), Err(QuizError::AlreadySubmitted));
    }

    #[test]
    fn test_manual_submit_records_elapsed_ticks() {
        let mut quiz = runner(1800);
        quiz.start().unwrap();
        for _ in 0..42 {
            quiz.tick();
        }
        let submission = quiz.submit().unwrap();
        assert_eq!(submission.time_spent, 42);
        assert_eq!(submission.reason, SubmitReason::Manual);
    }

    #[test]
    fn test_immediate_submit_records_zero() {
        let mut quiz = runner(30);
        quiz.start().unwrap();
        assert_eq!(quiz.submit().unwrap().time_spent, 0);
    }

    #[test]
    fn test_navigation_preserves_other_answers() {
        let mut quiz = runner(60);
        quiz.start().unwrap();
        quiz.set_answer("one").unwrap();
        quiz.next().unwrap();
        quiz.set_answer("two").unwrap();
        quiz.next().unwrap();
        quiz.previous().unwrap();
        quiz.previous().unwrap();
        assert_eq!(quiz.current_index(), 0);
        assert_eq!(quiz.answer_for(1), "one");
        assert_eq!(quiz.answer_for(2), "two");
        assert_eq!(quiz.answer_for(3), "");

        quiz.set_answer("one, revised").unwrap();
        assert_eq!(quiz.answer_for(2), "two");
    }

    #[test]
    fn test_navigation_clamped_to_bounds() {
        let mut quiz = runner(60);
        quiz.start().unwrap();
        quiz.previous().unwrap();
        assert_eq!(quiz.current_index(), 0);
        for _ in 0..5 {
            quiz.next().unwrap();
        }
        assert_eq!(quiz.current_index(), 2);
    }

    #[test]
    fn test_advance_submits_on_last_question() {
        let mut quiz = runner(60);
        quiz.start().unwrap();
        assert_eq!(quiz.advance_action(), Some(AdvanceAction::Next));
        assert_eq!(quiz.advance().unwrap(), None);
        assert_eq!(quiz.advance().unwrap(), None);
        assert_eq!(quiz.advance_action(), Some(AdvanceAction::Submit));
        let submission = quiz.advance().unwrap().expect("last advance submits");
        assert_eq!(submission.reason, SubmitReason::Manual);
        assert_eq!(quiz.advance(), Err(QuizError::AlreadySubmitted));
    }

    #[test]
    fn test_expired_submission_lists_every_question() {
        let mut quiz = runner(3);
        quiz.start().unwrap();
        quiz.set_answer("I build backends.").unwrap();
        let submission = loop {
            if let Tick::Expired(s) = quiz.tick() {
                break s;
            }
        };
        assert_eq!(submission.answers.len(), 3);
        assert_eq!(submission.answers[&1], "I build backends.");
        assert_eq!(submission.answers[&2], "");
        assert_eq!(submission.answers[&3], "");
        assert_eq!(submission.time_spent, 3);
    }

    #[test]
    fn test_editing_locked_after_submit() {
        let mut quiz = runner(60);
        quiz.start().unwrap();
        quiz.submit().unwrap();
        assert_eq!(quiz.set_answer("late"), Err(QuizError::AlreadySubmitted));
        assert_eq!(quiz.start(), Err(QuizError::AlreadySubmitted));
        let view = quiz.view(Uuid::nil());
        assert!(!view.answer_editable);
        assert!(view.advance_label.is_none());
    }

    #[test]
    fn test_double_start_rejected() {
        let mut quiz = runner(60);
        quiz.start().unwrap();
        assert_eq!(quiz.start(), Err(QuizError::AlreadyStarted));
    }

    #[test]
    fn test_submission_converts_to_new_session() {
        let mut quiz = runner(60);
        quiz.start().unwrap();
        quiz.tick();
        let session = quiz.submit().unwrap().into_new_session();
        assert_eq!(session.user_data.email, "jane@example.com");
        assert_eq!(session.time_spent, Some(1));
        assert_eq!(session.questions.len(), 3);
        assert!(session.completed_at.is_some());
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(1800), "30:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(0), "00:00");
    }
}
