//! Pending quiz questions per recipient
//!
//! Each recipient is either idle or awaiting an answer to exactly one
//! question. Opening a new quiz replaces any pending one.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use super::parser::QuizQuestion;
use crate::channels::RecipientId;

/// A question waiting for an answer
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub recipient: RecipientId,
    pub question: QuizQuestion,
    pub opened_at: DateTime<Utc>,
}

/// Result of resolving an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Nothing was pending for the recipient
    NoSession,
    /// The pending question was answered and closed
    Answered {
        matched: bool,
        correct_answer: String,
        prompt_sentence: String,
    },
}

/// In-memory store of pending quiz sessions
///
/// One lock guards the map; it is never held across an `.await`.
#[derive(Debug, Default)]
pub struct QuizSessionStore {
    sessions: Mutex<HashMap<RecipientId, QuizSession>>,
}

impl QuizSessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RecipientId, QuizSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start awaiting an answer to `question`, replacing any pending question
    ///
    /// Returns `true` if a previous question was discarded.
    pub fn open(&self, recipient: RecipientId, question: QuizQuestion) -> bool {
        let session = QuizSession {
            recipient,
            question,
            opened_at: Utc::now(),
        };
        let replaced = self.lock().insert(recipient, session).is_some();
        tracing::debug!(recipient, replaced, "quiz session opened");
        replaced
    }

    /// Check `answer` against the pending question and close the session
    ///
    /// Leaves state untouched when nothing is pending.
    pub fn resolve(&self, recipient: RecipientId, answer: &str) -> AnswerOutcome {
        let Some(session) = self.lock().remove(&recipient) else {
            return AnswerOutcome::NoSession;
        };

        let matched = session.question.is_correct(answer);
        tracing::debug!(recipient, matched, "quiz session resolved");

        AnswerOutcome::Answered {
            matched,
            correct_answer: session.question.correct_answer().to_string(),
            prompt_sentence: session.question.prompt_sentence().to_string(),
        }
    }

    /// Discard any pending question
    ///
    /// Returns `true` if a question was pending.
    pub fn cancel(&self, recipient: RecipientId) -> bool {
        self.lock().remove(&recipient).is_some()
    }

    /// Snapshot of the pending session, if any
    #[must_use]
    pub fn pending(&self, recipient: RecipientId) -> Option<QuizSession> {
        self.lock().get(&recipient).cloned()
    }

    /// Number of recipients awaiting an answer
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
