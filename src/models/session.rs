// src/models/session.rs

use serde::{Deserialize, Serialize};

use crate::models::result::QuizResult;

/// Attempt lifecycle. Transitions are one-way:
/// `NotStarted -> InProgress -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    #[serde(rename = "NOT STARTED")]
    NotStarted,
    #[serde(rename = "IN PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETED")]
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: String,
    pub selected_option_id: String,
}

/// One timed attempt at a published quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub quiz_id: String,
    pub status: SessionStatus,
    /// Epoch milliseconds.
    pub start_time: i64,
    /// Epoch milliseconds. `start_time + time limit`.
    pub deadline: i64,
    /// At most one entry per question.
    #[serde(default)]
    pub user_answers: Vec<UserAnswer>,
    /// Questions the taker explicitly confirmed.
    #[serde(default)]
    pub submitted_question_ids: Vec<String>,
    /// Presented question order. Empty means quiz order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub question_order: Vec<String>,
}

impl Session {
    pub fn is_in_progress(&self) -> bool {
        self.status == SessionStatus::InProgress
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&str> {
        self.user_answers
            .iter()
            .find(|a| a.question_id == question_id)
            .map(|a| a.selected_option_id.as_str())
    }

    pub fn is_submitted(&self, question_id: &str) -> bool {
        self.submitted_question_ids.iter().any(|id| id == question_id)
    }

    /// Copy of this session with `question_id` answered by `option_id`.
    /// An earlier answer to the same question is replaced in place.
    pub(crate) fn with_answer(&self, question_id: &str, option_id: &str) -> Session {
        let answer = UserAnswer {
            question_id: question_id.to_string(),
            selected_option_id: option_id.to_string(),
        };

        let mut user_answers: Vec<UserAnswer> = Vec::with_capacity(self.user_answers.len() + 1);
        let mut replaced = false;
        for existing in &self.user_answers {
            if existing.question_id == question_id {
                user_answers.push(answer.clone());
                replaced = true;
            } else {
                user_answers.push(existing.clone());
            }
        }
        if !replaced {
            user_answers.push(answer);
        }

        Session {
            user_answers,
            ..self.clone()
        }
    }
}

/// The persisted `quizzer-sessions` document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SessionsDocument {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub results: Vec<QuizResult>,
}
