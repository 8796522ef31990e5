//! Completion-service client for the sqlagent pipeline.
//!
//! One thin HTTP client (`CompletionClient`) plus typed helpers for each
//! pipeline task: intent classification, SQL generation with self-correction,
//! chat replies, and result summaries. All helpers speak the
//! OpenAI-compatible `/v1/chat/completions` surface.

mod ai_types;
mod chat;
mod client;
mod error;
mod generate;
mod intent;
mod summary;


pub use client::{CompletionClient, DEFAULT_MODEL};
pub use error::CompletionError;
pub use generate::{GeneratedSql, SqlGenerationRequest};
pub use intent::IntentClassification;
