// src/services/mod.rs

pub mod catalog;
pub mod scoring;
pub mod session_engine;
