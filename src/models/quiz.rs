// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::MIN_OPTIONS_PER_QUESTION;

/// Lifecycle of a quiz definition.
/// Only drafts can be edited or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuizStatus {
    Draft,
    Published,
}

/// Unit of `Quiz::time_limit_value`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    /// Documents written without a unit always meant minutes.
    #[default]
    Minutes,
}

impl TimeUnit {
    pub fn to_millis(self, value: u32) -> i64 {
        let value = i64::from(value);
        match self {
            TimeUnit::Seconds => value * 1000,
            TimeUnit::Minutes => value * 60 * 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,

    /// The text shown to the quiz taker.
    pub prompt: String,

    /// Required questions must be submitted before an attempt counts as complete.
    pub required: bool,

    /// Weight added to the score when answered correctly.
    pub point_value: u32,

    pub options: Vec<QuizOption>,

    /// Id of the correct option. Empty until the author picks one.
    #[serde(default)]
    pub correct_answer_id: String,
}

impl Question {
    pub fn option(&self, option_id: &str) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// A quiz definition, owned by the catalog.
///
/// Every field is owned data, so `clone()` yields a fully independent deep copy:
/// no nested question or option is shared with the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub time_limit_value: u32,
    #[serde(default)]
    pub time_limit_unit: TimeUnit,
    #[serde(default)]
    pub shuffle_questions: bool,
    pub questions: Vec<Question>,
    pub status: QuizStatus,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds, refreshed on every mutation.
    pub updated_at: i64,
}

impl Quiz {
    /// Attempt duration in milliseconds.
    pub fn time_limit_millis(&self) -> i64 {
        self.time_limit_unit.to_millis(self.time_limit_value)
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Summed in `u64` so any number of `u32` weights fits.
    pub fn max_score(&self) -> u64 {
        self.questions.iter().map(|q| u64::from(q.point_value)).sum()
    }

    pub fn is_published(&self) -> bool {
        self.status == QuizStatus::Published
    }
}

/// Outcome of a publish attempt.
/// Carries every validation problem, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub success: bool,
    pub errors: Vec<String>,
}

impl PublishOutcome {
    pub fn published() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    pub fn rejected(errors: Vec<String>) -> Self {
        Self {
            success: false,
            errors,
        }
    }
}

/// DTO for a partial update of the quiz-level fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizMetadataUpdate {
    #[validate(length(max = 200, message = "Title must be at most 200 characters."))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters."))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Time limit must be positive."))]
    pub time_limit_value: Option<u32>,
    pub time_limit_unit: Option<TimeUnit>,
    pub shuffle_questions: Option<bool>,
}

/// DTO for a partial update of a single question.
/// `None` fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionUpdate {
    pub prompt: Option<String>,
    pub required: Option<bool>,
    pub point_value: Option<u32>,
    pub options: Option<Vec<QuizOption>>,
    pub correct_answer_id: Option<String>,
}

impl QuestionUpdate {
    /// A replacement option list shorter than the floor is ignored. When the
    /// options change, a correct answer that is no longer among them is cleared.
    pub(crate) fn apply_to(self, question: &Question) -> Question {
        let replaced = self
            .options
            .filter(|options| options.len() >= MIN_OPTIONS_PER_QUESTION);
        let options_changed = replaced.is_some();
        let options = replaced.unwrap_or_else(|| question.options.clone());

        let mut correct_answer_id = self
            .correct_answer_id
            .unwrap_or_else(|| question.correct_answer_id.clone());
        if options_changed && !options.iter().any(|o| o.id == correct_answer_id) {
            correct_answer_id.clear();
        }

        Question {
            id: question.id.clone(),
            prompt: self.prompt.unwrap_or_else(|| question.prompt.clone()),
            required: self.required.unwrap_or(question.required),
            point_value: self.point_value.unwrap_or(question.point_value),
            options,
            correct_answer_id,
        }
    }
}
