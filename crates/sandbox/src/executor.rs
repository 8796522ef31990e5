use std::time::Duration;

use sqlagent_core::{
    DEFAULT_EXEC_TIMEOUT_SECS, ErrorRecord, ExecErrorKind, ExecutionResult, ExecutionSuccess,
    INFRA_RETRY_COUNT, MAX_RESULT_ROWS, SANDBOX_POOL_MAX_CONNECTIONS, is_read_only_statement,
};
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{Column, MySqlPool, Row};

use crate::classify::classify_sqlx_error;
use crate::error::SandboxError;

/// Executor over the isolated sandbox database.
///
/// Each statement runs on its own pooled connection, so one request's
/// failure cannot leak transactional state into another. Infrastructure
/// faults (timeout, lost connection) re-execute the same SQL a bounded
/// number of times before escalating; everything else goes straight back
/// to the caller as a classified failure.
#[derive(Debug, Clone)]
pub struct SqlSandbox {
    pool: MySqlPool,
    exec_timeout: Duration,
    infra_retries: u32,
}

impl SqlSandbox {
    /// Connect to the sandbox database.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self, SandboxError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(SANDBOX_POOL_MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(SandboxError::Connect)?;
        tracing::info!("sandbox pool established");
        Ok(Self {
            pool,
            exec_timeout: Duration::from_secs(DEFAULT_EXEC_TIMEOUT_SECS),
            infra_retries: INFRA_RETRY_COUNT,
        })
    }

    /// Override the per-statement execution deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.exec_timeout = timeout;
        self
    }

    /// Override the infrastructure retry bound.
    #[must_use]
    pub const fn with_infra_retries(mut self, retries: u32) -> Self {
        self.infra_retries = retries;
        self
    }

    #[must_use]
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Execute one read-only statement and classify the outcome.
    ///
    /// The read-only guard runs before the database sees the statement; a
    /// mutation comes back as `PermissionDenied` without a round trip. This
    /// is the second enforcement layer behind the generator's refusal.
    pub async fn execute(&self, sql: &str) -> ExecutionResult {
        if !is_read_only_statement(sql) {
            let detail = sqlagent_core::forbidden_verb(sql)
                .map_or_else(String::new, |verb| format!(" ({verb} is forbidden)"));
            return ExecutionResult::Failure(ErrorRecord::new(
                ExecErrorKind::PermissionDenied,
                format!("statement rejected: the sandbox only executes a single read-only query{detail}"),
            ));
        }

        let mut last_failure: Option<ErrorRecord> = None;
        for infra_attempt in 0..=self.infra_retries {
            if infra_attempt > 0 {
                tracing::warn!(
                    attempt = infra_attempt,
                    max = self.infra_retries,
                    "re-executing after infrastructure fault"
                );
                tokio::time::sleep(Duration::from_millis(200 * u64::from(infra_attempt))).await;
            }

            match self.run_once(sql).await {
                ExecutionResult::Success(ok) => return ExecutionResult::Success(ok),
                ExecutionResult::Failure(record) if record.kind.is_infrastructure() => {
                    last_failure = Some(record);
                },
                failure => return failure,
            }
        }

        // Infrastructure retries exhausted; the orchestrator treats this
        // kind as fatal rather than regenerating SQL.
        ExecutionResult::Failure(last_failure.unwrap_or_else(|| {
            ErrorRecord::new(ExecErrorKind::ConnectionError, "sandbox unavailable")
        }))
    }

    async fn run_once(&self, sql: &str) -> ExecutionResult {
        let fetch = sqlx::query(sql).fetch_all(&self.pool);
        match tokio::time::timeout(self.exec_timeout, fetch).await {
            Err(_) => ExecutionResult::Failure(ErrorRecord::new(
                ExecErrorKind::Timeout,
                format!("query exceeded {}s deadline", self.exec_timeout.as_secs()),
            )),
            Ok(Err(e)) => ExecutionResult::Failure(classify_sqlx_error(&e)),
            Ok(Ok(rows)) => ExecutionResult::Success(rows_to_success(&rows)),
        }
    }
}

fn rows_to_success(rows: &[MySqlRow]) -> ExecutionSuccess {
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_owned()).collect())
        .unwrap_or_default();

    let row_count = rows.len();
    let converted = rows
        .iter()
        .take(MAX_RESULT_ROWS)
        .map(|row| {
            let mut object = serde_json::Map::new();
            for (idx, column) in row.columns().iter().enumerate() {
                object.insert(column.name().to_owned(), cell_to_json(row, idx));
            }
            object
        })
        .collect();

    ExecutionSuccess { rows: converted, row_count, columns }
}

/// Decode one cell into JSON by trying the common MySQL decodings in
/// order. An undecodable cell becomes a string of its raw bytes rather
/// than failing the whole result.
fn cell_to_json(row: &MySqlRow, idx: usize) -> serde_json::Value {
    use serde_json::Value;

    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
        return v.map_or(Value::Null, |dt| Value::from(dt.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
        return v.map_or(Value::Null, |d| Value::from(d.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveTime>, _>(idx) {
        return v.map_or(Value::Null, |t| Value::from(t.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v.map_or(Value::Null, |bytes| {
            Value::from(String::from_utf8_lossy(&bytes).into_owned())
        });
    }
    Value::Null
}
