//! Service traits the orchestrator programs against.
//!
//! Production wires these to `CompletionClient`, `ExampleRetriever`, and
//! `SqlSandbox`; tests substitute scripted mocks.

use async_trait::async_trait;
use sqlagent_core::{ConversationTurn, ExecutionResult, ExecutionSuccess};
use sqlagent_llm::{
    CompletionClient, CompletionError, GeneratedSql, IntentClassification, SqlGenerationRequest,
};
use sqlagent_retrieval::{ExampleRetriever, RetrievalError};
use sqlagent_sandbox::SqlSandbox;

/// Completion-service boundary.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn classify_intent(
        &self,
        utterance: &str,
        transcript: &[ConversationTurn],
    ) -> Result<IntentClassification, CompletionError>;

    async fn generate_sql(
        &self,
        req: &SqlGenerationRequest<'_>,
    ) -> Result<GeneratedSql, CompletionError>;

    async fn chat_reply(
        &self,
        utterance: &str,
        transcript: &[ConversationTurn],
    ) -> Result<String, CompletionError>;

    async fn summarize_result(
        &self,
        utterance: &str,
        sql: &str,
        result: &ExecutionSuccess,
    ) -> Result<String, CompletionError>;
}

#[async_trait]
impl CompletionService for CompletionClient {
    async fn classify_intent(
        &self,
        utterance: &str,
        transcript: &[ConversationTurn],
    ) -> Result<IntentClassification, CompletionError> {
        Self::classify_intent(self, utterance, transcript).await
    }

    async fn generate_sql(
        &self,
        req: &SqlGenerationRequest<'_>,
    ) -> Result<GeneratedSql, CompletionError> {
        Self::generate_sql(self, req).await
    }

    async fn chat_reply(
        &self,
        utterance: &str,
        transcript: &[ConversationTurn],
    ) -> Result<String, CompletionError> {
        Self::chat_reply(self, utterance, transcript).await
    }

    async fn summarize_result(
        &self,
        utterance: &str,
        sql: &str,
        result: &ExecutionSuccess,
    ) -> Result<String, CompletionError> {
        Self::summarize_result(self, utterance, sql, result).await
    }
}

/// Example-retrieval boundary (vector search over the corpus).
#[async_trait]
pub trait ExampleService: Send + Sync {
    /// Similar examples rendered for the generation prompt. Empty string
    /// when the corpus has nothing relevant.
    async fn similar_for_prompt(
        &self,
        utterance: &str,
        tables: &[String],
        k: usize,
    ) -> Result<String, RetrievalError>;

    /// Feedback path: persist a verified pair after successful execution.
    async fn add_verified(
        &self,
        natural_language_query: &str,
        sql_text: &str,
        tables: &[String],
    ) -> Result<(), RetrievalError>;
}

#[async_trait]
impl ExampleService for ExampleRetriever {
    async fn similar_for_prompt(
        &self,
        utterance: &str,
        tables: &[String],
        k: usize,
    ) -> Result<String, RetrievalError> {
        Self::similar_for_prompt(self, utterance, tables, k).await
    }

    async fn add_verified(
        &self,
        natural_language_query: &str,
        sql_text: &str,
        tables: &[String],
    ) -> Result<(), RetrievalError> {
        Self::add_verified(self, natural_language_query, sql_text, tables).await
    }
}

/// Sandbox execution boundary. Always returns a classified result; only
/// setup-time faults are errors, and those happen before requests flow.
#[async_trait]
pub trait SqlExecutorService: Send + Sync {
    async fn execute(&self, sql: &str) -> ExecutionResult;
}

#[async_trait]
impl SqlExecutorService for SqlSandbox {
    async fn execute(&self, sql: &str) -> ExecutionResult {
        Self::execute(self, sql).await
    }
}
