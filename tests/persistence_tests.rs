// tests/persistence_tests.rs

mod common;

use std::sync::Arc;

use common::{START, answer_key, publish_quiz, spawn_app, spawn_app_with};
use quizzer::{
    AppError,
    config::{QUIZZES_KEY, SESSIONS_KEY},
    models::{
        quiz::{Quiz, QuizStatus, TimeUnit},
        session::SessionStatus,
    },
    storage::{FileStorage, MemoryStorage, Storage},
    utils::clock::ManualClock,
};

#[test]
fn catalog_survives_restart() {
    let mut app = spawn_app();
    let quiz_id = publish_quiz(&mut app, "Durable", &[1, 2]);
    let draft = app.state.catalog.create_new_quiz();
    app.state.catalog.save_draft_quiz(draft.clone()).unwrap();

    let reloaded = spawn_app_with(app.storage.clone(), app.clock.clone());
    let catalog = &reloaded.state.catalog;

    assert_eq!(catalog.quizzes().len(), 3);
    assert_eq!(catalog.get_quiz_by_id(&quiz_id), app.state.catalog.get_quiz_by_id(&quiz_id));
    assert_eq!(catalog.get_quiz_by_id(&draft.id).unwrap().status, QuizStatus::Draft);
    // The editing quiz is transient.
    assert!(catalog.current_editing_quiz().is_none());
}

#[test]
fn in_progress_session_and_answers_survive_restart() {
    let mut app = spawn_app();
    let quiz_id = publish_quiz(&mut app, "Paused", &[1, 1]);
    let key = answer_key(&app, &quiz_id);
    let session = app.state.start_session(&quiz_id).unwrap();
    app.state.engine.record_answer(&key[0].0, &key[0].1);
    app.state.engine.submit_answer(&key[0].0);
    app.state.engine.leave_session();

    let mut reloaded = spawn_app_with(app.storage.clone(), app.clock.clone());

    let current = reloaded.state.engine.current_session().expect("session restored").clone();
    assert_eq!(current.id, session.id);
    assert_eq!(current.answer_for(&key[0].0), Some(key[0].1.as_str()));
    assert_eq!(current.submitted_question_ids, vec![key[0].0.clone()]);

    let result = reloaded.state.complete_session().unwrap();
    assert_eq!(result.score, 1);
}

#[test]
fn results_survive_restart_keyed_by_quiz() {
    let mut app = spawn_app();
    let first = publish_quiz(&mut app, "One", &[1]);
    let second = publish_quiz(&mut app, "Two", &[1]);
    app.state.start_session(&first);
    app.state.complete_session();
    app.state.start_session(&second);
    app.state.complete_session();

    let reloaded = spawn_app_with(app.storage.clone(), app.clock.clone());

    assert_eq!(reloaded.state.engine.results().len(), 2);
    assert_eq!(
        reloaded.state.engine.get_results_for_quiz(&first),
        app.state.engine.get_results_for_quiz(&first)
    );
    assert!(reloaded.state.engine.current_session().is_none());
    assert!(
        reloaded
            .state
            .engine
            .sessions()
            .iter()
            .all(|s| s.status == SessionStatus::Completed)
    );
}

#[test]
fn sessions_document_uses_expected_layout() {
    let mut app = spawn_app();
    let quiz_id = publish_quiz(&mut app, "Layout", &[1]);
    app.state.start_session(&quiz_id);

    let raw = app.storage.get(SESSIONS_KEY).unwrap().expect("document written");
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();

    let session = &doc["sessions"][0];
    assert_eq!(session["status"], "IN PROGRESS");
    assert_eq!(session["quizId"], quiz_id.as_str());
    assert_eq!(session["startTime"], START);
    assert!(session["userAnswers"].as_array().unwrap().is_empty());
    assert!(doc["results"].as_array().unwrap().is_empty());

    let raw_quizzes = app.storage.get(QUIZZES_KEY).unwrap().unwrap();
    let quizzes: serde_json::Value = serde_json::from_str(&raw_quizzes).unwrap();
    assert_eq!(quizzes[1]["status"], "PUBLISHED");
    assert_eq!(quizzes[1]["timeLimitUnit"], "minutes");
    assert!(quizzes[1]["questions"][0]["correctAnswerId"].is_string());
}

#[test]
fn malformed_quizzes_fall_back_to_sample() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(QUIZZES_KEY, "{not json").unwrap();

    let app = spawn_app_with(storage.clone(), ManualClock::new(START));

    assert_eq!(app.state.catalog.quizzes().len(), 1);
    assert_eq!(app.state.catalog.quizzes()[0].title, "Astro Quiz");
    // The fallback is written back so the next start reads valid data.
    let raw = storage.get(QUIZZES_KEY).unwrap().unwrap();
    assert!(serde_json::from_str::<Vec<Quiz>>(&raw).is_ok());
}

#[test]
fn malformed_sessions_fall_back_to_empty_state() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(SESSIONS_KEY, "[1, 2, 3").unwrap();

    let app = spawn_app_with(storage, ManualClock::new(START));

    assert!(app.state.engine.sessions().is_empty());
    assert!(app.state.engine.results().is_empty());
    assert!(app.state.engine.current_session().is_none());
}

#[test]
fn legacy_quiz_without_time_unit_means_minutes() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set(
            QUIZZES_KEY,
            r#"[{
                "id": "legacy",
                "title": "Old",
                "description": "",
                "timeLimitValue": 2,
                "shuffleQuestions": false,
                "questions": [{
                    "id": "q1",
                    "prompt": "Still here?",
                    "required": true,
                    "pointValue": 1,
                    "options": [{"id": "y", "text": "Yes"}, {"id": "n", "text": "No"}],
                    "correctAnswerId": "y"
                }],
                "status": "PUBLISHED",
                "createdAt": 1,
                "updatedAt": 1
            }]"#,
        )
        .unwrap();

    let mut app = spawn_app_with(storage, ManualClock::new(START));
    let quiz = app.state.catalog.get_quiz_by_id("legacy").unwrap();
    assert_eq!(quiz.time_limit_unit, TimeUnit::Minutes);

    let session = app.state.start_session("legacy").unwrap();
    assert_eq!(session.deadline, START + 120_000);
}

#[test]
fn latest_in_progress_session_is_restored() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set(
            SESSIONS_KEY,
            r#"{
                "sessions": [
                    {"id": "old", "quizId": "a", "status": "IN PROGRESS", "startTime": 100, "deadline": 9000000000000, "userAnswers": []},
                    {"id": "done", "quizId": "b", "status": "COMPLETED", "startTime": 900, "deadline": 1000, "userAnswers": []},
                    {"id": "new", "quizId": "c", "status": "IN PROGRESS", "startTime": 500, "deadline": 9000000000000, "userAnswers": []},
                    {"id": "tie", "quizId": "d", "status": "IN PROGRESS", "startTime": 500, "deadline": 9000000000000, "userAnswers": []}
                ],
                "results": []
            }"#,
        )
        .unwrap();

    let app = spawn_app_with(storage, ManualClock::new(START));

    assert_eq!(app.state.engine.sessions().len(), 4);
    assert_eq!(app.state.engine.current_session().unwrap().id, "new");
}

#[test]
fn equal_start_times_restore_first_stored_session() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set(
            SESSIONS_KEY,
            r#"{
                "sessions": [
                    {"id": "done", "quizId": "z", "status": "COMPLETED", "startTime": 700, "deadline": 800, "userAnswers": []},
                    {"id": "first", "quizId": "a", "status": "IN PROGRESS", "startTime": 500, "deadline": 9000000000000, "userAnswers": []},
                    {"id": "second", "quizId": "b", "status": "IN PROGRESS", "startTime": 500, "deadline": 9000000000000, "userAnswers": []}
                ],
                "results": []
            }"#,
        )
        .unwrap();

    let app = spawn_app_with(storage, ManualClock::new(START));

    assert_eq!(app.state.engine.current_session().unwrap().id, "first");
}

#[test]
fn extreme_stored_deadline_does_not_overflow() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set(
            SESSIONS_KEY,
            r#"{
                "sessions": [
                    {"id": "odd", "quizId": "a", "status": "IN PROGRESS", "startTime": 0, "deadline": -9223372036854775808, "userAnswers": []}
                ],
                "results": []
            }"#,
        )
        .unwrap();

    let app = spawn_app_with(storage, ManualClock::new(START));

    assert_eq!(app.state.engine.time_remaining(), 0);
    assert!(app.state.engine.is_time_expired());
}

#[test]
fn file_storage_round_trips_documents() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path().join("nested")).unwrap();

    assert!(storage.get(QUIZZES_KEY).unwrap().is_none());

    storage.set(QUIZZES_KEY, "[]").unwrap();
    storage.set(QUIZZES_KEY, "[1]").unwrap();
    assert_eq!(storage.get(QUIZZES_KEY).unwrap().as_deref(), Some("[1]"));
    assert!(dir.path().join("nested").join("quizzer-quizzes.json").exists());

    let err = storage.set("../escape", "{}").unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));
}
