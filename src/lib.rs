// src/lib.rs

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod timer;
pub mod utils;

// Re-export specific items for convenience
pub use error::{AppError, AppResult};
pub use services::{catalog::QuizCatalog, session_engine::SessionEngine};
pub use state::{AppState, SharedState};
pub use timer::Countdown;
