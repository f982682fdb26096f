//! dotpoint-core: Question banks, progress stats, and the sheet sync engine.
//!
//! This crate defines the CSV tokenizer, the question and progress data
//! model, and the backend-agnostic sync engine the rest of dotpoint builds on.

pub mod bank;
pub mod engine;
pub mod error;
pub mod model;
pub mod progress;
pub mod report;
pub mod store;
pub mod tokenizer;
pub mod traits;
