//! Sandboxed SQL execution.
//!
//! Runs candidate statements against an isolated MySQL instance reachable
//! only by this crate, classifies failures into retry-relevant kinds, and
//! introspects the sandbox schema into a `SchemaCatalog`.

mod classify;
mod error;
mod executor;
mod introspect;

pub use classify::classify_mysql_error_number;
pub use error::SandboxError;
pub use executor::SqlSandbox;
