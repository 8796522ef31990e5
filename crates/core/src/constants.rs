//! Shared constants for sqlagent.
//!
//! Centralizes tunables the pipeline references from more than one crate.

/// Additional generation attempts after the first one. `attempts.len()` is
/// therefore bounded by this value + 1.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Similar examples injected into the generation prompt.
pub const DEFAULT_TOP_K: usize = 3;

/// Per-statement sandbox execution deadline, seconds.
pub const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 30;

/// Re-executions of the same SQL after an infrastructure fault before the
/// fault escalates to fatal. Distinct from the semantic retry bound.
pub const INFRA_RETRY_COUNT: u32 = 2;

/// Per-call completion-service timeout, seconds.
pub const COMPLETION_TIMEOUT_SECS: u64 = 60;

/// Sandbox connection pool size. One connection serves one in-flight
/// statement, so this also caps concurrent executions.
pub const SANDBOX_POOL_MAX_CONNECTIONS: u32 = 5;

/// Rows kept in an `ExecutionSuccess` payload; the rest is truncated.
pub const MAX_RESULT_ROWS: usize = 100;

/// Rows shown when rendering a result table for display.
pub const MAX_DISPLAY_ROWS: usize = 10;

/// Cell width when rendering a result table for display.
pub const MAX_DISPLAY_CELL_LEN: usize = 50;

/// Transcript turns the intent classifier sees for follow-up
/// disambiguation.
pub const INTENT_CONTEXT_TURNS: usize = 6;

/// Fallback table count when lexical schema scoring finds no strong match.
pub const SCHEMA_FALLBACK_TABLES: usize = 5;
