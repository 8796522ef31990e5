//! Typed error enum for the sandbox crate.
//!
//! SQL-level failures are not errors here: they come back inside
//! `ExecutionResult::Failure` so the retry loop can reason about them.
//! This enum covers only setup-time faults.

use thiserror::Error;

/// Errors establishing or introspecting the sandbox.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("sandbox connection failed: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("schema introspection failed: {0}")]
    Introspection(#[source] sqlx::Error),
}
