// src/services/scoring.rs

use crate::models::{
    quiz::{Question, Quiz},
    result::{QuestionScore, QuizResult},
    session::Session,
};

/// Grades one question against the session's recorded answer.
/// An unanswered question is never correct.
pub fn score_question(session: &Session, question: &Question) -> QuestionScore {
    let user_answer_id = session.answer_for(&question.id).unwrap_or_default().to_string();
    let is_correct = !user_answer_id.is_empty() && user_answer_id == question.correct_answer_id;

    QuestionScore {
        question_id: question.id.clone(),
        user_answer_id,
        correct_answer_id: question.correct_answer_id.clone(),
        is_correct,
    }
}

/// Scores a session against its quiz.
///
/// Pure and deterministic. Question scores follow quiz order, not the order
/// the answers were given in.
pub fn calculate_results(session: &Session, quiz: &Quiz) -> QuizResult {
    let question_scores: Vec<QuestionScore> = quiz
        .questions
        .iter()
        .map(|question| score_question(session, question))
        .collect();

    let score = quiz
        .questions
        .iter()
        .zip(&question_scores)
        .filter(|(_, qs)| qs.is_correct)
        .map(|(question, _)| u64::from(question.point_value))
        .sum();
    let max_score = quiz.max_score();

    QuizResult {
        session_id: session.id.clone(),
        quiz_id: quiz.id.clone(),
        score,
        max_score,
        percentage: percentage(score, max_score),
        question_scores,
    }
}

/// `score / max_score` as a whole percent, rounded half up. Zero when there is nothing to score.
pub fn percentage(score: u64, max_score: u64) -> u32 {
    if max_score == 0 {
        return 0;
    }
    // Integer form of round(score * 100 / max): add half the divisor before dividing.
    let scaled = u128::from(score) * 200 + u128::from(max_score);
    let rounded = scaled / (u128::from(max_score) * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}
