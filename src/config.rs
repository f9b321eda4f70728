// src/config.rs

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;

/// Storage key of the quiz catalog document.
pub const QUIZZES_KEY: &str = "quizzer-quizzes";
/// Storage key of the sessions/results document.
pub const SESSIONS_KEY: &str = "quizzer-sessions";

/// Time limit assigned to freshly created quizzes (in minutes).
pub const DEFAULT_TIME_LIMIT_VALUE: u32 = 10;
/// Below this many seconds left, an attempt counts as running out of time.
pub const RUNNING_OUT_THRESHOLD_SECS: u64 = 60;
/// Minimum number of options a question keeps while being edited.
pub const MIN_OPTIONS_PER_QUESTION: usize = 2;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub tick_interval: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let data_dir = env::var("QUIZZER_DATA_DIR").unwrap_or_else(|_| "data".to_string());

        let log_dir = env::var("QUIZZER_LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let tick_ms = env::var("QUIZZER_TICK_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(1000);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            data_dir: PathBuf::from(data_dir),
            log_dir: PathBuf::from(log_dir),
            tick_interval: Duration::from_millis(tick_ms),
            rust_log,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_dir: PathBuf::from("logs"),
            tick_interval: Duration::from_secs(1),
            rust_log: "info".to_string(),
        }
    }
}
