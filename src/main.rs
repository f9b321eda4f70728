// src/main.rs

use std::sync::Arc;

use dotenvy::dotenv;
use quizzer::config::Config;
use quizzer::state::{AppState, lock_state};
use quizzer::storage::FileStorage;
use quizzer::timer::Countdown;
use quizzer::utils::{clock::SystemClock, id::UuidGenerator};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "quizzer.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let storage = FileStorage::open(&config.data_dir)?;
    tracing::info!("Using data directory {}", config.data_dir.display());

    let tick_interval = config.tick_interval;
    let state = AppState::load(
        config,
        Arc::new(storage),
        Arc::new(SystemClock),
        Arc::new(UuidGenerator),
    );

    for entry in state.quiz_overview() {
        tracing::info!(
            "{:?} quiz \"{}\" ({} questions): {:?}",
            entry.quiz.status,
            entry.quiz.title,
            entry.quiz.questions.len(),
            entry.display_status
        );
    }

    if let Some(session) = state.engine.current_session() {
        tracing::info!(
            "Restored session {} for quiz {} ({}s left)",
            session.id,
            session.quiz_id,
            state.engine.time_remaining()
        );
    }

    let shared = state.into_shared();
    let (countdown, mut timeouts) = Countdown::spawn(shared.clone(), tick_interval);

    loop {
        tokio::select! {
            Some(event) = timeouts.recv() => {
                tracing::info!(
                    "Quiz {} timed out: {}/{} ({}%)",
                    event.quiz_id,
                    event.result.score,
                    event.result.max_score,
                    event.result.percentage
                );
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down...");
                break;
            }
        }
    }

    countdown.shutdown().await;

    let results = lock_state(&shared).engine.results().len();
    tracing::info!("{} results stored", results);

    Ok(())
}
