//! Typed error enum for the embeddings crate.

use thiserror::Error;

/// Errors from embedding-service calls. Surfaced to the Orchestrator as
/// part of the `RetrievalServiceError` boundary.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding client initialization failed: {0}")]
    ClientInit(String),
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("embedding response parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("embedding generation returned empty result")]
    EmptyResult,
    #[error("batch size mismatch: sent {sent} texts, received {received} vectors")]
    BatchMismatch { sent: usize, received: usize },
}
