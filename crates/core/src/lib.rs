//! Core types for sqlagent
//!
//! This crate contains the domain types shared across all other crates:
//! conversation turns, intents, schema fragments, examples, generation
//! attempts, and the per-request session state.

mod attempt;
mod constants;
mod env_config;
mod error;
mod example;
mod intent;
mod schema;
mod sql_guard;
mod text;
mod turn;

pub use attempt::*;
pub use constants::*;
pub use env_config::*;
pub use error::*;
pub use example::*;
pub use intent::*;
pub use schema::*;
pub use sql_guard::*;
pub use text::*;
pub use turn::*;
