use serde::{Deserialize, Serialize};

use crate::error::ErrorRecord;
use crate::intent::Intent;
use crate::schema::SchemaFragment;
use crate::turn::ConversationTurn;

/// One generation + execution cycle within the bounded retry loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationAttempt {
    /// 1-based position in the retry history.
    pub attempt_number: u32,
    pub sql_text: String,
    pub rationale: String,
    /// The failure of the immediately preceding attempt, if any. Each retry
    /// conditions only on this, never on the full history.
    pub prior_error: Option<ErrorRecord>,
}

/// Outcome of running one SQL statement in the sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    Success(ExecutionSuccess),
    Failure(ErrorRecord),
}

impl ExecutionResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Rows returned by a successful execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSuccess {
    /// Each row as a column-name → value object.
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub row_count: usize,
    pub columns: Vec<String>,
}

/// Terminal payload of one handled request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FinalReply {
    /// Conversational answer, no SQL involved.
    Chat { text: String },
    /// The SQL pipeline reached `Done`.
    Query { sql: String, result: ExecutionSuccess, summary: String },
    /// The SQL pipeline reached `Failed`; carries the last error for the
    /// user-facing diagnostic.
    Error { last_sql: Option<String>, error: ErrorRecord },
    /// Retrieval found nothing to query; ask the user to rephrase.
    Clarification { text: String },
}

/// Per-request mutable state, owned exclusively by the Orchestrator from
/// creation to terminal state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub turns: Vec<ConversationTurn>,
    pub current_intent: Option<Intent>,
    /// Computed at most once per request, then shared read-only by every
    /// attempt.
    pub retrieved_schema: Vec<SchemaFragment>,
    pub attempts: Vec<GenerationAttempt>,
    pub final_result: Option<FinalReply>,
}

impl SessionState {
    #[must_use]
    pub fn new(transcript: Vec<ConversationTurn>) -> Self {
        Self { turns: transcript, ..Self::default() }
    }

    /// The most recent attempt, if any.
    #[must_use]
    pub fn last_attempt(&self) -> Option<&GenerationAttempt> {
        self.attempts.last()
    }

    /// Append the next attempt, enforcing the strictly-incrementing
    /// attempt-number invariant.
    pub fn push_attempt(&mut self, attempt: GenerationAttempt) {
        debug_assert_eq!(attempt.attempt_number as usize, self.attempts.len() + 1);
        self.attempts.push(attempt);
    }
}

/// What `handle_request` hands back to the caller once a terminal state is
/// reached. Always complete: a failure carries the full attempt history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub intent: Intent,
    pub reply: FinalReply,
    pub attempts: Vec<GenerationAttempt>,
    pub tables_used: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecErrorKind;

    #[test]
    fn test_push_attempt_keeps_order() {
        let mut state = SessionState::default();
        state.push_attempt(GenerationAttempt {
            attempt_number: 1,
            sql_text: "SELECT 1".to_owned(),
            rationale: String::new(),
            prior_error: None,
        });
        state.push_attempt(GenerationAttempt {
            attempt_number: 2,
            sql_text: "SELECT 2".to_owned(),
            rationale: String::new(),
            prior_error: Some(ErrorRecord::new(ExecErrorKind::SyntaxError, "boom")),
        });
        assert_eq!(state.attempts.len(), 2);
        assert_eq!(state.last_attempt().unwrap().attempt_number, 2);
    }

    #[test]
    fn test_execution_result_tags() {
        let ok = ExecutionResult::Success(ExecutionSuccess {
            rows: vec![],
            row_count: 0,
            columns: vec![],
        });
        assert!(ok.is_success());
        let err = ExecutionResult::Failure(ErrorRecord::new(ExecErrorKind::Timeout, "slow"));
        assert!(!err.is_success());
    }
}
