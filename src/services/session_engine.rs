// src/services/session_engine.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    config::{RUNNING_OUT_THRESHOLD_SECS, SESSIONS_KEY},
    models::{
        quiz::{Question, Quiz},
        result::{QuestionScore, QuizResult},
        session::{Session, SessionStatus, SessionsDocument},
    },
    services::{
        catalog::QuizSource,
        scoring::{calculate_results, score_question},
    },
    storage::{SharedStorage, load_json, save_json},
    utils::{clock::Clock, id::IdGenerator},
};

/// Emitted when the countdown auto-completes an expired attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutEvent {
    pub quiz_id: String,
    pub session_id: String,
    pub result: QuizResult,
}

/// Owns attempts and their results.
///
/// * `sessions` holds every attempt, in progress or completed.
/// * `current` is the attempt being taken right now. It is always `InProgress`
///   and mirrors its entry in `sessions`.
/// * `results` keeps the latest result per quiz id.
///
/// Every mutation is written to storage before the call returns.
pub struct SessionEngine {
    sessions: Vec<Session>,
    current: Option<Session>,
    results: BTreeMap<String, QuizResult>,
    storage: SharedStorage,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    rng: StdRng,
}

impl SessionEngine {
    /// Restores sessions and results from storage.
    ///
    /// A malformed document is logged and replaced by empty state. An
    /// `InProgress` session found on load becomes the current one.
    pub fn load(storage: SharedStorage, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        let mut engine = Self {
            sessions: Vec::new(),
            current: None,
            results: BTreeMap::new(),
            storage,
            clock,
            ids,
            rng: StdRng::from_entropy(),
        };

        match load_json::<SessionsDocument>(engine.storage.as_ref(), SESSIONS_KEY) {
            Ok(Some(document)) => engine.restore(document),
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load sessions from storage: {}", e),
        }

        engine
    }

    /// Reseeds the question shuffler, making shuffled orders reproducible.
    pub fn seed_shuffle(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn results(&self) -> &BTreeMap<String, QuizResult> {
        &self.results
    }

    pub fn get_results_for_quiz(&self, quiz_id: &str) -> Option<&QuizResult> {
        self.results.get(quiz_id)
    }

    /// Starts an attempt at a published quiz, or resumes the one already in progress.
    ///
    /// Returns `None` when the quiz does not exist or is still a draft.
    pub fn start_session(&mut self, quizzes: &impl QuizSource, quiz_id: &str) -> Option<Session> {
        let Some(quiz) = quizzes.quiz_by_id(quiz_id) else {
            tracing::warn!("Cannot start session: quiz {} not found", quiz_id);
            return None;
        };

        if !quiz.is_published() {
            tracing::warn!("Cannot start session: quiz {} is not published", quiz_id);
            return None;
        }

        let existing = self
            .sessions
            .iter()
            .find(|s| s.quiz_id == quiz_id && s.is_in_progress())
            .cloned();

        if let Some(mut session) = existing {
            // Attempts stored before the order was tracked get one now, as long as
            // nothing has been answered against the default order yet.
            if quiz.shuffle_questions
                && session.question_order.is_empty()
                && session.user_answers.is_empty()
            {
                session.question_order = self.shuffled_order(quiz);
                self.replace_session(session.clone());
                self.persist();
            }

            tracing::info!("Resuming session {} for quiz {}", session.id, quiz_id);
            self.current = Some(session.clone());
            return Some(session);
        }

        let now = self.clock.now_millis();
        let question_order = if quiz.shuffle_questions {
            self.shuffled_order(quiz)
        } else {
            Vec::new()
        };

        let session = Session {
            id: self.ids.next_id(),
            quiz_id: quiz_id.to_string(),
            status: SessionStatus::InProgress,
            start_time: now,
            deadline: now + quiz.time_limit_millis(),
            user_answers: Vec::new(),
            submitted_question_ids: Vec::new(),
            question_order,
        };

        tracing::info!(
            "Started session {} for quiz {} (deadline in {} ms)",
            session.id,
            quiz_id,
            session.deadline - now
        );

        self.sessions.push(session.clone());
        self.current = Some(session.clone());
        self.persist();

        Some(session)
    }

    /// Records `option_id` as the answer to `question_id`, replacing any earlier choice.
    /// Silently ignored without an in-progress current session.
    pub fn record_answer(&mut self, question_id: &str, option_id: &str) {
        let Some(session) = self.active_session() else {
            return;
        };

        if session.answer_for(question_id) == Some(option_id) {
            return;
        }

        let updated = session.with_answer(question_id, option_id);
        self.replace_session(updated);
        self.persist();
    }

    /// Marks a question as explicitly confirmed, unlocking its feedback.
    ///
    /// Requires an answer to have been recorded for the question. Idempotent.
    /// Returns whether the question is submitted after the call.
    pub fn submit_answer(&mut self, question_id: &str) -> bool {
        let Some(session) = self.active_session() else {
            return false;
        };

        if session.is_submitted(question_id) {
            return true;
        }

        if session.answer_for(question_id).is_none() {
            tracing::debug!("Cannot submit question {}: no answer selected", question_id);
            return false;
        }

        let mut submitted_question_ids = session.submitted_question_ids.clone();
        submitted_question_ids.push(question_id.to_string());
        let updated = Session {
            submitted_question_ids,
            ..session.clone()
        };

        self.replace_session(updated);
        self.persist();
        true
    }

    /// Scores and closes the current attempt.
    ///
    /// Returns `None` when there is no current session (for instance because the
    /// countdown already completed it) or its quiz cannot be resolved.
    pub fn complete_session(&mut self, quizzes: &impl QuizSource) -> Option<QuizResult> {
        let session = self.current.as_ref()?;

        let Some(quiz) = quizzes.quiz_by_id(&session.quiz_id) else {
            tracing::warn!(
                "Cannot complete session {}: quiz {} not found",
                session.id,
                session.quiz_id
            );
            return None;
        };

        let result = calculate_results(session, quiz);
        let completed = Session {
            status: SessionStatus::Completed,
            ..session.clone()
        };

        self.sessions = self
            .sessions
            .iter()
            .map(|s| if s.id == completed.id { completed.clone() } else { s.clone() })
            .collect();
        self.results.insert(completed.quiz_id.clone(), result.clone());
        self.current = None;
        self.persist();

        tracing::info!(
            "Completed session {} for quiz {}: {}/{} ({}%)",
            completed.id,
            completed.quiz_id,
            result.score,
            result.max_score,
            result.percentage
        );

        Some(result)
    }

    /// Pauses: the attempt stays `InProgress` in storage and can be resumed.
    pub fn leave_session(&mut self) {
        if let Some(session) = self.current.take() {
            tracing::info!("Left session {}", session.id);
        }
    }

    /// Whole seconds left on the current attempt, rounded up. Zero without one.
    pub fn time_remaining(&self) -> u64 {
        let Some(session) = self.active_session() else {
            return 0;
        };

        let remaining_ms = session.deadline.saturating_sub(self.clock.now_millis()).max(0) as u64;
        remaining_ms.div_ceil(1000)
    }

    pub fn is_time_running_out(&self) -> bool {
        let remaining = self.time_remaining();
        remaining > 0 && remaining < RUNNING_OUT_THRESHOLD_SECS
    }

    /// True once the current attempt's deadline has passed.
    pub fn is_time_expired(&self) -> bool {
        self.active_session().is_some() && self.time_remaining() == 0
    }

    /// One countdown step.
    ///
    /// If the current attempt has expired it is completed exactly as
    /// `complete_session` would, and the timeout is reported.
    pub fn tick(&mut self, quizzes: &impl QuizSource) -> Option<TimeoutEvent> {
        if !self.is_time_expired() {
            return None;
        }

        let session_id = self.current.as_ref()?.id.clone();

        match self.complete_session(quizzes) {
            Some(result) => {
                tracing::info!("Session {} timed out for quiz {}", session_id, result.quiz_id);
                Some(TimeoutEvent {
                    quiz_id: result.quiz_id.clone(),
                    session_id,
                    result,
                })
            }
            None => {
                // Nothing to score against; stop ticking on this attempt.
                tracing::warn!("Expired session {} could not be scored, leaving it", session_id);
                self.leave_session();
                None
            }
        }
    }

    pub fn current_answer(&self, question_id: &str) -> Option<&str> {
        self.current.as_ref()?.answer_for(question_id)
    }

    /// Graded feedback for a question of the current attempt, only once it was submitted.
    pub fn question_feedback(
        &self,
        quizzes: &impl QuizSource,
        question_id: &str,
    ) -> Option<QuestionScore> {
        let session = self.current.as_ref()?;
        if !session.is_submitted(question_id) {
            return None;
        }

        let question = quizzes.quiz_by_id(&session.quiz_id)?.question(question_id)?;
        Some(score_question(session, question))
    }

    /// Whether every required question of the current attempt has been submitted.
    pub fn is_quiz_complete(&self, quizzes: &impl QuizSource) -> bool {
        let Some(session) = self.current.as_ref() else {
            return false;
        };
        let Some(quiz) = quizzes.quiz_by_id(&session.quiz_id) else {
            return false;
        };

        quiz.questions
            .iter()
            .filter(|q| q.required)
            .all(|q| session.is_submitted(&q.id))
    }

    /// Questions of the current attempt in the order they are presented.
    pub fn presented_questions(&self, quizzes: &impl QuizSource) -> Vec<Question> {
        let Some(session) = self.current.as_ref() else {
            return Vec::new();
        };
        let Some(quiz) = quizzes.quiz_by_id(&session.quiz_id) else {
            return Vec::new();
        };

        if session.question_order.is_empty() {
            return quiz.questions.clone();
        }

        let mut ordered: Vec<Question> = session
            .question_order
            .iter()
            .filter_map(|id| quiz.question(id).cloned())
            .collect();
        for question in &quiz.questions {
            if !session.question_order.contains(&question.id) {
                ordered.push(question.clone());
            }
        }
        ordered
    }

    fn active_session(&self) -> Option<&Session> {
        self.current.as_ref().filter(|s| s.is_in_progress())
    }

    fn shuffled_order(&mut self, quiz: &Quiz) -> Vec<String> {
        let mut order: Vec<String> = quiz.questions.iter().map(|q| q.id.clone()).collect();
        order.shuffle(&mut self.rng);
        order
    }

    /// Swaps in a new snapshot of a session, both in the list and as current
    /// when it is the current one.
    fn replace_session(&mut self, updated: Session) {
        self.sessions = self
            .sessions
            .iter()
            .map(|s| if s.id == updated.id { updated.clone() } else { s.clone() })
            .collect();

        if self.current.as_ref().is_some_and(|c| c.id == updated.id) {
            self.current = Some(updated);
        }
    }

    fn restore(&mut self, document: SessionsDocument) {
        let SessionsDocument { sessions, results } = document;

        self.results = results
            .into_iter()
            .map(|result| (result.quiz_id.clone(), result))
            .collect();

        let in_progress: Vec<&Session> = sessions.iter().filter(|s| s.is_in_progress()).collect();
        if in_progress.len() > 1 {
            tracing::warn!(
                "Found {} in-progress sessions in storage, restoring the most recently started",
                in_progress.len()
            );
        }

        // Latest start wins; ties keep the first one stored.
        let active = in_progress
            .into_iter()
            .fold(None::<&Session>, |best, s| match best {
                Some(b) if b.start_time >= s.start_time => Some(b),
                _ => Some(s),
            })
            .cloned();

        tracing::info!(
            "Loaded {} sessions and {} results from storage",
            sessions.len(),
            self.results.len()
        );

        self.current = active;
        self.sessions = sessions;
    }

    fn persist(&self) {
        let document = SessionsDocument {
            sessions: self.sessions.clone(),
            results: self.results.values().cloned().collect(),
        };

        if let Err(e) = save_json(self.storage.as_ref(), SESSIONS_KEY, &document) {
            tracing::error!("Failed to persist sessions: {:?}", e);
        }
    }
}
