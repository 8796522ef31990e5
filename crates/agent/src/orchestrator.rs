//! The request state machine.
//!
//! Classifying → {ChatReplying, Retrieving}; Retrieving → Generating;
//! Generating → Executing; Executing → {Done, Generating, Failed}.
//! The Generating ⇄ Executing loop runs at most `max_retries` additional
//! times after the first attempt, each retry conditioning on the
//! immediately preceding failure.

use std::future::Future;
use std::sync::Arc;

use sqlagent_core::{
    ErrorRecord, ExecErrorKind, ExecutionResult, ExecutionSuccess, FinalReply, GenerationAttempt,
    Intent, RequestOutcome, SchemaCatalog, SessionState, format_schema_for_prompt,
};
use sqlagent_llm::{GeneratedSql, SqlGenerationRequest};
use tokio_util::sync::CancellationToken;

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::intent::classify;
use crate::schema::retrieve_schema;
use crate::session::{AgentSession, FailedQuery};
use crate::traits::{CompletionService, ExampleService, SqlExecutorService};

const CHAT_FALLBACK_REPLY: &str =
    "Sorry, I could not produce a reply just now. Please try again in a moment.";

const CLARIFICATION_REPLY: &str = "I could not find any sandbox tables matching your request. \
Could you rephrase it, or name the tables you want to query?";

/// Drives one request at a time through the pipeline. Shared services are
/// injected once at construction; per-request state lives in a fresh
/// `SessionState` owned by the running call.
pub struct Orchestrator {
    completion: Arc<dyn CompletionService>,
    examples: Arc<dyn ExampleService>,
    executor: Arc<dyn SqlExecutorService>,
    catalog: Arc<SchemaCatalog>,
    config: AgentConfig,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("catalog_tables", &self.catalog.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        completion: Arc<dyn CompletionService>,
        examples: Arc<dyn ExampleService>,
        executor: Arc<dyn SqlExecutorService>,
        catalog: Arc<SchemaCatalog>,
        config: AgentConfig,
    ) -> Self {
        Self { completion, examples, executor, catalog, config }
    }

    /// Handle one user utterance, driving the state machine to a terminal
    /// state. Synchronous from the caller's view: the returned outcome is
    /// always terminal (`ChatReplying`, `Done`, or `Failed`), never a
    /// partial result.
    ///
    /// # Errors
    /// Returns an error only for cancellation and service-boundary faults;
    /// every SQL-level failure comes back inside the outcome with the last
    /// SQL and error message attached.
    pub async fn handle_request(
        &self,
        utterance: &str,
        session: &mut AgentSession,
        cancel: &CancellationToken,
    ) -> Result<RequestOutcome, AgentError> {
        // State: Classifying. The transcript seen by the classifier
        // excludes the turn being handled.
        let intent =
            cancellable(cancel, classify(self.completion.as_ref(), utterance, &session.turns))
                .await?;
        tracing::info!(intent = intent.as_str(), "request classified");

        // The prompt-facing transcript stops before the turn being handled;
        // every prompt builder appends the utterance itself.
        let mut state = SessionState::new(session.turns.clone());
        state.current_intent = Some(intent);
        session.push_user(utterance);

        let outcome = match intent {
            Intent::Chat => self.chat_replying(utterance, &state, cancel).await?,
            Intent::TextToSql | Intent::DebugRetry => {
                self.run_sql_pipeline(utterance, intent, &mut state, session, cancel).await?
            },
        };

        session.push_agent(reply_text(&outcome.reply));
        Ok(outcome)
    }

    /// Terminal state: ChatReplying. A completion failure degrades to a
    /// canned apology, never an error surface.
    async fn chat_replying(
        &self,
        utterance: &str,
        state: &SessionState,
        cancel: &CancellationToken,
    ) -> Result<RequestOutcome, AgentError> {
        let reply =
            match cancellable(cancel, self.completion.chat_reply(utterance, &state.turns)).await? {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "chat reply failed, using fallback");
                    CHAT_FALLBACK_REPLY.to_owned()
                },
            };
        Ok(RequestOutcome {
            intent: Intent::Chat,
            reply: FinalReply::Chat { text: reply },
            attempts: Vec::new(),
            tables_used: Vec::new(),
        })
    }

    async fn run_sql_pipeline(
        &self,
        utterance: &str,
        intent: Intent,
        state: &mut SessionState,
        session: &mut AgentSession,
        cancel: &CancellationToken,
    ) -> Result<RequestOutcome, AgentError> {
        // A debug-retry follow-up inherits the failed request's wording so
        // generation has a real question to answer, and seeds the first
        // attempt with the failure being repaired.
        let (query_text, mut prior) = match (&intent, &session.last_failure) {
            (Intent::DebugRetry, Some(failed)) => {
                (failed.utterance.clone(), Some((failed.sql.clone(), failed.error.clone())))
            },
            _ => (utterance.to_owned(), None),
        };

        // State: Retrieving. Computed exactly once, shared read-only by
        // every attempt.
        let Some(fragments) = retrieve_schema(&query_text, &self.catalog) else {
            tracing::warn!("schema retrieval found no tables, asking for clarification");
            return Ok(RequestOutcome {
                intent,
                reply: FinalReply::Clarification { text: CLARIFICATION_REPLY.to_owned() },
                attempts: Vec::new(),
                tables_used: Vec::new(),
            });
        };
        state.retrieved_schema = fragments;
        let tables: Vec<String> =
            state.retrieved_schema.iter().map(|f| f.table_name.clone()).collect();
        let schema_text = format_schema_for_prompt(&state.retrieved_schema);

        // Example retrieval degrades gracefully: generation without
        // examples beats failing the whole request.
        let examples_text = match cancellable(
            cancel,
            self.examples.similar_for_prompt(&query_text, &tables, self.config.top_k),
        )
        .await?
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "example retrieval failed, generating without examples");
                String::new()
            },
        };

        let mut refusals = 0_u32;

        // The Generating ⇄ Executing loop.
        for attempt_number in 1..=self.config.max_attempts() {
            let generated = {
                let request = SqlGenerationRequest {
                    utterance: &query_text,
                    schema: &schema_text,
                    examples: &examples_text,
                    prior: prior.as_ref().map(|(sql, err)| (sql.as_str(), err)),
                };
                cancellable(cancel, self.completion.generate_sql(&request)).await??
            };

            let (sql, rationale) = match generated {
                GeneratedSql::Statement { sql, rationale } => (sql, rationale),
                GeneratedSql::Refusal { reason } => {
                    // GenerationUnsafe: one stricter retry, then fatal.
                    refusals += 1;
                    let error = ErrorRecord::new(ExecErrorKind::PermissionDenied, reason);
                    state.push_attempt(GenerationAttempt {
                        attempt_number,
                        sql_text: String::new(),
                        rationale: String::new(),
                        prior_error: prior.take().map(|(_, e)| e),
                    });
                    if refusals > 1 || attempt_number >= self.config.max_attempts() {
                        return Ok(self.failed(intent, state, session, &query_text, None, error));
                    }
                    tracing::warn!(error = %error, "generation refused, retrying with stricter prompt");
                    prior = Some((String::new(), error));
                    continue;
                },
            };
            tracing::debug!(attempt = attempt_number, sql = %sql, "candidate generated");

            state.push_attempt(GenerationAttempt {
                attempt_number,
                sql_text: sql.clone(),
                rationale,
                prior_error: prior.take().map(|(_, e)| e),
            });

            // State: Executing.
            match cancellable(cancel, self.executor.execute(&sql)).await? {
                ExecutionResult::Success(result) => {
                    return Ok(self
                        .done(intent, state, session, &query_text, sql, result, &tables, cancel)
                        .await?);
                },
                ExecutionResult::Failure(error) => {
                    tracing::warn!(
                        attempt = attempt_number,
                        kind = error.kind.as_str(),
                        "execution failed"
                    );
                    if !error.kind.is_recoverable() || attempt_number >= self.config.max_attempts()
                    {
                        return Ok(self.failed(intent, state, session, &query_text, Some(sql), error));
                    }
                    prior = Some((sql, error));
                },
            }
        }

        // Unreachable: the loop always returns before exhausting its range.
        unreachable!("retry loop must reach a terminal state")
    }

    /// Terminal state: Done. Summary and feedback-capture are auxiliary;
    /// either failing degrades the response but never the result.
    #[allow(clippy::too_many_arguments)]
    async fn done(
        &self,
        intent: Intent,
        state: &mut SessionState,
        session: &mut AgentSession,
        query_text: &str,
        sql: String,
        result: ExecutionSuccess,
        tables: &[String],
        cancel: &CancellationToken,
    ) -> Result<RequestOutcome, AgentError> {
        let summary = match cancellable(
            cancel,
            self.completion.summarize_result(query_text, &sql, &result),
        )
        .await?
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "summary generation failed, using row count");
                format!("Query returned {} rows.", result.row_count)
            },
        };

        if let Err(e) = self.examples.add_verified(query_text, &sql, tables).await {
            tracing::warn!(error = %e, "feedback capture failed");
        }

        session.last_failure = None;
        state.final_result =
            Some(FinalReply::Query { sql: sql.clone(), result: result.clone(), summary: summary.clone() });
        Ok(RequestOutcome {
            intent,
            reply: FinalReply::Query { sql, result, summary },
            attempts: state.attempts.clone(),
            tables_used: tables.to_vec(),
        })
    }

    /// Terminal state: Failed. The outcome carries the last SQL, the last
    /// error verbatim, and the full attempt history.
    fn failed(
        &self,
        intent: Intent,
        state: &mut SessionState,
        session: &mut AgentSession,
        query_text: &str,
        last_sql: Option<String>,
        error: ErrorRecord,
    ) -> RequestOutcome {
        tracing::info!(
            attempts = state.attempts.len(),
            kind = error.kind.as_str(),
            "request failed terminally"
        );
        session.last_failure = Some(FailedQuery {
            utterance: query_text.to_owned(),
            sql: last_sql.clone().unwrap_or_default(),
            error: error.clone(),
        });
        let tables: Vec<String> =
            state.retrieved_schema.iter().map(|f| f.table_name.clone()).collect();
        state.final_result =
            Some(FinalReply::Error { last_sql: last_sql.clone(), error: error.clone() });
        RequestOutcome {
            intent,
            reply: FinalReply::Error { last_sql, error },
            attempts: state.attempts.clone(),
            tables_used: tables,
        }
    }
}

/// Run a pipeline suspension point under the request's cancellation token.
/// Cancellation aborts remaining state transitions; no further SQL runs.
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = T>,
) -> Result<T, AgentError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AgentError::Cancelled),
        out = fut => Ok(out),
    }
}

fn reply_text(reply: &FinalReply) -> String {
    match reply {
        FinalReply::Chat { text } | FinalReply::Clarification { text } => text.clone(),
        FinalReply::Query { sql, result, summary } => {
            format!("{summary}\n\nSQL:\n{sql}\n({} rows)", result.row_count)
        },
        FinalReply::Error { last_sql, error } => match last_sql {
            Some(sql) => format!("Query failed after retries.\nSQL:\n{sql}\nError: {error}"),
            None => format!("Query failed: {error}"),
        },
    }
}
