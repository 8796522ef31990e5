//! Typed error enum for the retrieval crate.

use sqlagent_embeddings::EmbeddingError;
use thiserror::Error;

/// Errors from example-store and retrieval operations. Surfaced to the
/// Orchestrator as the `RetrievalServiceError` boundary.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("embedding: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("corpus file I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("corpus serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("example store lock poisoned")]
    LockPoisoned,
}
