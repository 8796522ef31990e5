//! Agent pipeline for sqlagent.
//!
//! Sequences intent classification, schema retrieval, RAG-steered SQL
//! generation, and sandboxed execution inside a bounded-retry state
//! machine. Everything external (completion service, example retrieval,
//! execution) sits behind a trait, so the machine is testable without any
//! network or database.

mod config;
mod error;
mod intent;
mod orchestrator;
mod schema;
mod session;
mod traits;


pub use config::AgentConfig;
pub use error::AgentError;
pub use intent::classify;
pub use orchestrator::Orchestrator;
pub use schema::retrieve_schema;
pub use session::{AgentSession, FailedQuery};
pub use traits::{CompletionService, ExampleService, SqlExecutorService};
