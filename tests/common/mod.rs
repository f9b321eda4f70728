// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use quizzer::{
    config::Config,
    models::quiz::{QuestionUpdate, QuizMetadataUpdate, QuizOption, TimeUnit},
    state::AppState,
    storage::MemoryStorage,
    utils::{clock::ManualClock, id::SequentialIds},
};

pub const START: i64 = 1_700_000_000_000;

pub struct TestApp {
    pub state: AppState,
    pub clock: ManualClock,
    pub storage: Arc<MemoryStorage>,
}

/// Fresh app over empty in-memory storage, with a frozen clock and predictable ids.
pub fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(MemoryStorage::new()), ManualClock::new(START))
}

/// App over existing storage, as after a restart.
pub fn spawn_app_with(storage: Arc<MemoryStorage>, clock: ManualClock) -> TestApp {
    let state = AppState::load(
        Config::default(),
        storage.clone(),
        Arc::new(clock.clone()),
        Arc::new(SequentialIds::new("id")),
    );

    TestApp {
        state,
        clock,
        storage,
    }
}

/// Publishes a one-minute quiz with one question per entry of `point_values`.
///
/// Every question has three options, "Option 1" is correct.
pub fn publish_quiz(app: &mut TestApp, title: &str, point_values: &[u32]) -> String {
    publish_quiz_with(app, title, point_values, 1, TimeUnit::Minutes, false)
}

pub fn publish_quiz_with(
    app: &mut TestApp,
    title: &str,
    point_values: &[u32],
    time_limit_value: u32,
    time_limit_unit: TimeUnit,
    shuffle_questions: bool,
) -> String {
    let catalog = &mut app.state.catalog;
    let quiz_id = catalog.create_new_quiz().id;

    catalog
        .update_quiz_metadata(QuizMetadataUpdate {
            title: Some(title.to_string()),
            time_limit_value: Some(time_limit_value),
            time_limit_unit: Some(time_limit_unit),
            shuffle_questions: Some(shuffle_questions),
            ..Default::default()
        })
        .expect("metadata should be valid");

    for (index, points) in point_values.iter().enumerate() {
        let question_id = catalog
            .add_question(&format!("Question {}", index + 1), true)
            .expect("editing quiz exists");
        catalog.add_option_to_question(&question_id).expect("question exists");

        let options: Vec<QuizOption> = catalog
            .current_editing_quiz()
            .and_then(|quiz| quiz.question(&question_id))
            .expect("question exists")
            .options
            .iter()
            .enumerate()
            .map(|(n, option)| QuizOption {
                id: option.id.clone(),
                text: format!("Option {}", n + 1),
            })
            .collect();
        let correct = options[0].id.clone();

        catalog.update_question(
            &question_id,
            QuestionUpdate {
                point_value: Some(*points),
                options: Some(options),
                correct_answer_id: Some(correct),
                ..Default::default()
            },
        );
    }

    let quiz = catalog.current_editing_quiz().expect("editing quiz exists").clone();
    let outcome = catalog.publish_quiz(quiz);
    assert!(outcome.success, "publish failed: {:?}", outcome.errors);

    quiz_id
}

/// `(question_id, correct_option_id, wrong_option_id)` for every question of a quiz.
pub fn answer_key(app: &TestApp, quiz_id: &str) -> Vec<(String, String, String)> {
    app.state
        .catalog
        .get_quiz_by_id(quiz_id)
        .expect("quiz exists")
        .questions
        .iter()
        .map(|q| {
            let wrong = q
                .options
                .iter()
                .find(|o| o.id != q.correct_answer_id)
                .expect("question has a wrong option");
            (q.id.clone(), q.correct_answer_id.clone(), wrong.id.clone())
        })
        .collect()
}
