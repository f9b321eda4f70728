// src/state.rs

use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    config::Config,
    models::{
        quiz::Question,
        result::{QuestionScore, QuizOverview, QuizResult},
        session::{Session, SessionStatus},
    },
    services::{
        catalog::QuizCatalog,
        session_engine::{SessionEngine, TimeoutEvent},
    },
    storage::SharedStorage,
    utils::{clock::Clock, id::IdGenerator},
};

/// Application context, built once at startup and passed to whoever needs it.
///
/// Operations that need both managers live here so callers never wire the
/// catalog into the engine by hand.
pub struct AppState {
    pub config: Config,
    pub catalog: QuizCatalog,
    pub engine: SessionEngine,
}

/// The context as shared with the countdown task.
pub type SharedState = Arc<Mutex<AppState>>;

impl AppState {
    pub fn load(
        config: Config,
        storage: SharedStorage,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let catalog = QuizCatalog::load(storage.clone(), clock.clone(), ids.clone());
        let engine = SessionEngine::load(storage, clock, ids);

        Self {
            config,
            catalog,
            engine,
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn start_session(&mut self, quiz_id: &str) -> Option<Session> {
        self.engine.start_session(&self.catalog, quiz_id)
    }

    pub fn complete_session(&mut self) -> Option<QuizResult> {
        self.engine.complete_session(&self.catalog)
    }

    pub fn tick(&mut self) -> Option<TimeoutEvent> {
        self.engine.tick(&self.catalog)
    }

    pub fn question_feedback(&self, question_id: &str) -> Option<QuestionScore> {
        self.engine.question_feedback(&self.catalog, question_id)
    }

    pub fn is_quiz_complete(&self) -> bool {
        self.engine.is_quiz_complete(&self.catalog)
    }

    pub fn presented_questions(&self) -> Vec<Question> {
        self.engine.presented_questions(&self.catalog)
    }

    /// Every quiz with its attempt state, in catalog order.
    pub fn quiz_overview(&self) -> Vec<QuizOverview> {
        self.catalog
            .quizzes()
            .iter()
            .map(|quiz| {
                // A running attempt wins over older completed ones.
                let attempts = self.engine.sessions().iter().filter(|s| s.quiz_id == quiz.id);
                let session = attempts
                    .clone()
                    .find(|s| s.is_in_progress())
                    .or_else(|| attempts.last())
                    .cloned();
                let results = self.engine.get_results_for_quiz(&quiz.id).cloned();

                let display_status = match (&session, &results) {
                    (Some(s), _) if s.status != SessionStatus::NotStarted => s.status,
                    (_, Some(_)) => SessionStatus::Completed,
                    _ => SessionStatus::NotStarted,
                };

                QuizOverview {
                    quiz: quiz.clone(),
                    session,
                    results,
                    display_status,
                }
            })
            .collect()
    }
}

/// Locks the shared context, recovering it if a previous holder panicked.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("Application state lock was poisoned, recovering");
        poisoned.into_inner()
    })
}
