// src/models/result.rs

use serde::{Deserialize, Serialize};

use crate::models::{
    quiz::Quiz,
    session::{Session, SessionStatus},
};

/// Grading of a single question within a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionScore {
    pub question_id: String,
    /// Empty when the question was left unanswered.
    pub user_answer_id: String,
    pub correct_answer_id: String,
    pub is_correct: bool,
}

/// Scored outcome of a completed or timed-out session.
/// Only the latest result per quiz is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub session_id: String,
    pub quiz_id: String,
    pub score: u64,
    pub max_score: u64,
    pub percentage: u32,
    /// One entry per question, in quiz order.
    pub question_scores: Vec<QuestionScore>,
}

/// A quiz paired with its attempt state, for listing screens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOverview {
    pub quiz: Quiz,
    pub session: Option<Session>,
    pub results: Option<QuizResult>,
    pub display_status: SessionStatus,
}
