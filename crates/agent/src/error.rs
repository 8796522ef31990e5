//! Terminal error taxonomy for the agent pipeline.
//!
//! Recoverable failures never appear here: they live inside the retry loop
//! and end up in the attempt history. These variants are what can escape
//! `handle_request` as an `Err`.

use sqlagent_llm::CompletionError;
use sqlagent_retrieval::RetrievalError;
use sqlagent_sandbox::SandboxError;
use thiserror::Error;

/// Faults that terminate a request without a domain-level diagnostic.
///
/// Domain-terminal outcomes (chat reply, successful query, retries
/// exhausted, clarification) come back as `Ok(RequestOutcome)` instead, so
/// the caller always gets the last SQL and error message where one exists.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The completion service failed outright (`GenerationServiceError`).
    #[error("generation service: {0}")]
    GenerationService(#[from] CompletionError),

    /// The example-retrieval boundary failed outright
    /// (`RetrievalServiceError`).
    #[error("retrieval service: {0}")]
    RetrievalService(#[from] RetrievalError),

    /// Sandbox setup failed before any statement ran.
    #[error("sandbox: {0}")]
    Sandbox(#[from] SandboxError),

    /// The caller cancelled the request at a suspension point.
    #[error("request cancelled")]
    Cancelled,
}
