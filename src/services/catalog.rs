// src/services/catalog.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    config::{DEFAULT_TIME_LIMIT_VALUE, MIN_OPTIONS_PER_QUESTION, QUIZZES_KEY},
    error::{AppError, AppResult},
    models::quiz::{
        PublishOutcome, Question, QuestionUpdate, Quiz, QuizMetadataUpdate, QuizOption, QuizStatus,
        TimeUnit,
    },
    storage::{SharedStorage, load_json, save_json},
    utils::{clock::Clock, id::IdGenerator},
};

const ONE_DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Read-only quiz lookup.
///
/// The session engine resolves quiz content through this seam and never
/// mutates what it gets back.
pub trait QuizSource {
    fn quiz_by_id(&self, id: &str) -> Option<&Quiz>;
}

/// Owns every quiz definition (draft and published) plus the quiz being edited.
///
/// The editing quiz is transient: it reaches storage only through
/// `save_draft_quiz` or `publish_quiz`.
pub struct QuizCatalog {
    quizzes: Vec<Quiz>,
    current_editing: Option<Quiz>,
    storage: SharedStorage,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl QuizSource for QuizCatalog {
    fn quiz_by_id(&self, id: &str) -> Option<&Quiz> {
        self.get_quiz_by_id(id)
    }
}

impl QuizCatalog {
    /// Restores the catalog from storage.
    ///
    /// A missing or malformed document is not an error: the catalog falls
    /// back to a single published sample quiz so there is always something
    /// to take.
    pub fn load(storage: SharedStorage, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        let mut catalog = Self {
            quizzes: Vec::new(),
            current_editing: None,
            storage,
            clock,
            ids,
        };

        match load_json::<Vec<Quiz>>(catalog.storage.as_ref(), QUIZZES_KEY) {
            Ok(Some(quizzes)) => {
                tracing::info!("Loaded {} quizzes from storage", quizzes.len());
                catalog.quizzes = quizzes;
                return catalog;
            }
            Ok(None) => tracing::info!("No stored quizzes found, seeding sample quiz"),
            Err(e) => tracing::warn!("Failed to load quizzes from storage: {}", e),
        }

        catalog.seed_sample_quiz();
        catalog
    }

    pub fn quizzes(&self) -> &[Quiz] {
        &self.quizzes
    }

    pub fn published_quizzes(&self) -> Vec<&Quiz> {
        self.quizzes.iter().filter(|q| q.status == QuizStatus::Published).collect()
    }

    pub fn draft_quizzes(&self) -> Vec<&Quiz> {
        self.quizzes.iter().filter(|q| q.status == QuizStatus::Draft).collect()
    }

    pub fn get_quiz_by_id(&self, id: &str) -> Option<&Quiz> {
        self.quizzes.iter().find(|q| q.id == id)
    }

    pub fn current_editing_quiz(&self) -> Option<&Quiz> {
        self.current_editing.as_ref()
    }

    pub fn is_quiz_valid(&self) -> bool {
        self.current_editing
            .as_ref()
            .is_some_and(|quiz| validate_quiz(quiz).is_empty())
    }

    /// Starts a fresh draft and makes it the editing quiz. Nothing is stored yet.
    pub fn create_new_quiz(&mut self) -> Quiz {
        let now = self.clock.now_millis();
        let quiz = Quiz {
            id: self.ids.next_id(),
            title: String::new(),
            description: String::new(),
            time_limit_value: DEFAULT_TIME_LIMIT_VALUE,
            time_limit_unit: TimeUnit::Minutes,
            shuffle_questions: false,
            questions: Vec::new(),
            status: QuizStatus::Draft,
            created_at: now,
            updated_at: now,
        };

        self.current_editing = Some(quiz.clone());
        quiz
    }

    /// Puts an independent copy of a stored draft into edit mode.
    ///
    /// * `Ok(None)` if the quiz does not exist.
    /// * `Err(AppError::Immutable)` if it is published.
    pub fn load_quiz_for_editing(&mut self, id: &str) -> AppResult<Option<Quiz>> {
        let Some(quiz) = self.get_quiz_by_id(id) else {
            return Ok(None);
        };

        if quiz.is_published() {
            return Err(AppError::Immutable(format!("Cannot edit a published quiz ({id})")));
        }

        let editable = quiz.clone();
        self.current_editing = Some(editable.clone());
        Ok(Some(editable))
    }

    /// Upserts `quiz` as a draft and keeps it as the editing quiz.
    ///
    /// Refuses to overwrite a stored published quiz, which would silently
    /// demote it back to draft.
    pub fn save_draft_quiz(&mut self, quiz: Quiz) -> AppResult<()> {
        if self.get_quiz_by_id(&quiz.id).is_some_and(Quiz::is_published) {
            return Err(AppError::Immutable(format!(
                "Cannot save a published quiz as draft ({})",
                quiz.id
            )));
        }

        let updated = Quiz {
            status: QuizStatus::Draft,
            updated_at: self.clock.now_millis(),
            ..quiz
        };

        self.upsert(updated.clone());
        self.current_editing = Some(updated);
        Ok(())
    }

    /// Validates and publishes `quiz`.
    /// On failure the catalog is left untouched and every error is returned.
    pub fn publish_quiz(&mut self, quiz: Quiz) -> PublishOutcome {
        let errors = validate_quiz(&quiz);
        if !errors.is_empty() {
            tracing::debug!("Publish of quiz {} rejected with {} errors", quiz.id, errors.len());
            return PublishOutcome::rejected(errors);
        }

        let published = Quiz {
            status: QuizStatus::Published,
            updated_at: self.clock.now_millis(),
            ..quiz
        };

        tracing::info!("Published quiz {} ({})", published.id, published.title);
        self.upsert(published);
        self.current_editing = None;
        PublishOutcome::published()
    }

    pub fn discard_quiz(&mut self) {
        self.current_editing = None;
    }

    /// Removes a draft.
    ///
    /// * `Ok(false)` if the quiz does not exist.
    /// * `Err(AppError::Immutable)` for published quizzes, which are kept forever.
    pub fn delete_quiz(&mut self, id: &str) -> AppResult<bool> {
        let Some(quiz) = self.get_quiz_by_id(id) else {
            return Ok(false);
        };

        if quiz.status != QuizStatus::Draft {
            return Err(AppError::Immutable(format!("Can only delete draft quizzes ({id})")));
        }

        self.quizzes = self.quizzes.iter().filter(|q| q.id != id).cloned().collect();
        self.persist();

        if self.current_editing.as_ref().is_some_and(|q| q.id == id) {
            self.current_editing = None;
        }

        tracing::info!("Deleted draft quiz {}", id);
        Ok(true)
    }

    /// Applies a partial update of the quiz-level fields to the editing quiz.
    pub fn update_quiz_metadata(&mut self, update: QuizMetadataUpdate) -> AppResult<()> {
        update.validate()?;

        self.update_current(|quiz| Quiz {
            title: update.title.unwrap_or_else(|| quiz.title.clone()),
            description: update.description.unwrap_or_else(|| quiz.description.clone()),
            time_limit_value: update.time_limit_value.unwrap_or(quiz.time_limit_value),
            time_limit_unit: update.time_limit_unit.unwrap_or(quiz.time_limit_unit),
            shuffle_questions: update.shuffle_questions.unwrap_or(quiz.shuffle_questions),
            ..quiz.clone()
        });
        Ok(())
    }

    /// Appends a question with two blank options. Returns its id.
    pub fn add_question(&mut self, prompt: &str, required: bool) -> Option<String> {
        self.current_editing.as_ref()?;

        let question = Question {
            id: self.ids.next_id(),
            prompt: prompt.to_string(),
            required,
            point_value: 1,
            options: vec![self.blank_option(), self.blank_option()],
            correct_answer_id: String::new(),
        };
        let question_id = question.id.clone();

        self.update_current(|quiz| {
            let mut questions = quiz.questions.clone();
            questions.push(question);
            Quiz {
                questions,
                ..quiz.clone()
            }
        });
        Some(question_id)
    }

    pub fn remove_question(&mut self, question_id: &str) {
        self.update_current(|quiz| Quiz {
            questions: quiz
                .questions
                .iter()
                .filter(|q| q.id != question_id)
                .cloned()
                .collect(),
            ..quiz.clone()
        });
    }

    pub fn update_question(&mut self, question_id: &str, update: QuestionUpdate) {
        if update.options.as_ref().is_some_and(|o| o.len() < MIN_OPTIONS_PER_QUESTION) {
            tracing::debug!("Ignoring option list below the minimum for question {}", question_id);
        }

        self.update_current(|quiz| Quiz {
            questions: quiz
                .questions
                .iter()
                .map(|q| {
                    if q.id == question_id {
                        update.clone().apply_to(q)
                    } else {
                        q.clone()
                    }
                })
                .collect(),
            ..quiz.clone()
        });
    }

    /// Appends a blank option to a question. Returns its id.
    pub fn add_option_to_question(&mut self, question_id: &str) -> Option<String> {
        let has_question = self
            .current_editing
            .as_ref()
            .is_some_and(|quiz| quiz.question(question_id).is_some());
        if !has_question {
            return None;
        }

        let option = self.blank_option();
        let option_id = option.id.clone();

        self.map_question(question_id, |q| {
            let mut options = q.options.clone();
            options.push(option.clone());
            Question {
                options,
                ..q.clone()
            }
        });
        Some(option_id)
    }

    /// Removes an option, refusing to go below two options per question.
    /// Removing the correct option clears the question's correct answer.
    ///
    /// Returns whether the option was removed.
    pub fn remove_option_from_question(&mut self, question_id: &str, option_id: &str) -> bool {
        let removable = self
            .current_editing
            .as_ref()
            .and_then(|quiz| quiz.question(question_id))
            .is_some_and(|q| {
                q.options.len() > MIN_OPTIONS_PER_QUESTION && q.option(option_id).is_some()
            });
        if !removable {
            tracing::debug!("Refused to remove option {} from question {}", option_id, question_id);
            return false;
        }

        self.map_question(question_id, |q| Question {
            options: q.options.iter().filter(|o| o.id != option_id).cloned().collect(),
            correct_answer_id: if q.correct_answer_id == option_id {
                String::new()
            } else {
                q.correct_answer_id.clone()
            },
            ..q.clone()
        });
        true
    }

    pub fn update_option(&mut self, question_id: &str, option_id: &str, text: &str) {
        self.map_question(question_id, |q| Question {
            options: q
                .options
                .iter()
                .map(|o| {
                    if o.id == option_id {
                        QuizOption {
                            id: o.id.clone(),
                            text: text.to_string(),
                        }
                    } else {
                        o.clone()
                    }
                })
                .collect(),
            ..q.clone()
        });
    }

    pub fn validate_quiz(&self, quiz: &Quiz) -> Vec<String> {
        validate_quiz(quiz)
    }

    pub fn get_validation_errors(&self) -> Vec<String> {
        self.current_editing.as_ref().map(validate_quiz).unwrap_or_default()
    }

    fn blank_option(&self) -> QuizOption {
        QuizOption {
            id: self.ids.next_id(),
            text: String::new(),
        }
    }

    /// Replaces the editing quiz with `f(current)` and refreshes `updated_at`.
    /// No-op when nothing is being edited.
    fn update_current<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&Quiz) -> Quiz,
    {
        let Some(quiz) = self.current_editing.as_ref() else {
            return false;
        };

        let updated = Quiz {
            updated_at: self.clock.now_millis(),
            ..f(quiz)
        };
        self.current_editing = Some(updated);
        true
    }

    fn map_question<F>(&mut self, question_id: &str, f: F) -> bool
    where
        F: Fn(&Question) -> Question,
    {
        self.update_current(|quiz| Quiz {
            questions: quiz
                .questions
                .iter()
                .map(|q| if q.id == question_id { f(q) } else { q.clone() })
                .collect(),
            ..quiz.clone()
        })
    }

    fn upsert(&mut self, quiz: Quiz) {
        if self.quizzes.iter().any(|q| q.id == quiz.id) {
            self.quizzes = self
                .quizzes
                .iter()
                .map(|q| if q.id == quiz.id { quiz.clone() } else { q.clone() })
                .collect();
        } else {
            self.quizzes.push(quiz);
        }

        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = save_json(self.storage.as_ref(), QUIZZES_KEY, &self.quizzes) {
            tracing::error!("Failed to persist quizzes: {:?}", e);
        }
    }

    fn seed_sample_quiz(&mut self) {
        let options: Vec<QuizOption> = ["Titan", "Europa", "Ganymede", "Io"]
            .into_iter()
            .map(|text| QuizOption {
                id: self.ids.next_id(),
                text: text.to_string(),
            })
            .collect();
        let correct_answer_id = options[2].id.clone();

        let created = self.clock.now_millis() - ONE_DAY_MILLIS;
        let sample = Quiz {
            id: self.ids.next_id(),
            title: "Astro Quiz".to_string(),
            description: "What do you know about astronomy?".to_string(),
            time_limit_value: DEFAULT_TIME_LIMIT_VALUE,
            time_limit_unit: TimeUnit::Minutes,
            shuffle_questions: false,
            questions: vec![Question {
                id: self.ids.next_id(),
                prompt: "What is the largest moon in the Solar System?".to_string(),
                required: true,
                point_value: 1,
                options,
                correct_answer_id,
            }],
            status: QuizStatus::Published,
            created_at: created,
            updated_at: created,
        };

        self.quizzes = vec![sample];
        self.persist();
    }
}

/// Collects every reason `quiz` cannot be published, in a stable order.
///
/// Never stops at the first problem: the author sees the full list.
pub fn validate_quiz(quiz: &Quiz) -> Vec<String> {
    let mut errors = Vec::new();

    if quiz.title.trim().is_empty() {
        errors.push("Quiz title is required".to_string());
    }

    if quiz.questions.is_empty() {
        errors.push("Quiz must have at least one question".to_string());
    }

    for (index, question) in quiz.questions.iter().enumerate() {
        let question_num = index + 1;

        if question.prompt.trim().is_empty() {
            errors.push(format!("Question {question_num}: Prompt is required"));
        }

        if question.options.len() < MIN_OPTIONS_PER_QUESTION {
            errors.push(format!("Question {question_num}: Must have at least 2 options"));
        }

        if question.correct_answer_id.is_empty() {
            errors.push(format!("Question {question_num}: Correct answer is required"));
        }

        if question.option(&question.correct_answer_id).is_none() {
            errors.push(format!(
                "Question {question_num}: Correct answer must be one of the options"
            ));
        }

        for (option_index, option) in question.options.iter().enumerate() {
            if option.text.trim().is_empty() {
                errors.push(format!(
                    "Question {question_num}, Option {}: Text is required",
                    option_index + 1
                ));
            }
        }
    }

    errors
}
