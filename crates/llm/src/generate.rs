use sqlagent_core::{ErrorRecord, ExecErrorKind, is_read_only_statement, strip_code_fences};

use crate::ai_types::{ChatRequest, Message, ResponseFormat, SqlJson};
use crate::client::CompletionClient;
use crate::error::CompletionError;

/// Everything the generator conditions on for one attempt.
///
/// `prior` carries only the immediately preceding failure, never the full
/// history: the correction signal stays unambiguous.
#[derive(Debug, Clone)]
pub struct SqlGenerationRequest<'a> {
    pub utterance: &'a str,
    /// Retrieved schema subset, already rendered for the prompt.
    pub schema: &'a str,
    /// Similar examples block, already rendered for the prompt. May be empty.
    pub examples: &'a str,
    /// SQL text and failure of the previous attempt, if this is a retry.
    pub prior: Option<(&'a str, &'a ErrorRecord)>,
}

/// Output of one generation call: a candidate statement or an explicit
/// refusal. Mutating SQL is never returned as a statement.
#[derive(Debug, Clone)]
pub enum GeneratedSql {
    Statement { sql: String, rationale: String },
    Refusal { reason: String },
}

const GENERATE_SYSTEM_PROMPT: &str = r#"You are a SQL expert generating MySQL statements.

Rules:
1. Generate exactly ONE read-only SELECT statement. Never INSERT, UPDATE,
   DELETE, DROP, ALTER, TRUNCATE, CREATE, REPLACE, GRANT, or REVOKE.
2. Use only tables and columns from the provided schema.
3. Respect JOIN relationships and foreign keys.
4. Add WHERE, ORDER BY, and LIMIT clauses where the request implies them.
5. If the request requires mutating data, refuse.

Return JSON:
{"sql": "...", "rationale": "one sentence on how the query answers the request"}
or, when refusing:
{"refusal": "why the request cannot be served read-only"}"#;

const FORBID_MUTATION_REMINDER: &str = "The previous statement was rejected for attempting a \
mutation. The sandbox is strictly read-only: produce a SELECT-only statement or refuse.";

impl CompletionClient {
    /// Generate a candidate SQL statement for the utterance.
    ///
    /// When `prior` is set the prompt carries the failed SQL and its error
    /// message so the model can self-correct; after a permission failure it
    /// additionally forbids mutation in so many words. Output that fails
    /// the local read-only guard becomes a `Refusal` regardless of what the
    /// model claimed.
    ///
    /// # Errors
    /// Returns an error if the completion call fails or returns an
    /// unparsable body.
    pub async fn generate_sql(
        &self,
        req: &SqlGenerationRequest<'_>,
    ) -> Result<GeneratedSql, CompletionError> {
        let mut user_prompt = format!(
            "## Database Schema\n\n{}\n{}## User Request\n\n{}\n",
            req.schema,
            if req.examples.is_empty() {
                String::new()
            } else {
                format!("\n{}\n\n", req.examples)
            },
            req.utterance,
        );

        if let Some((prior_sql, error)) = req.prior {
            user_prompt.push_str(&format!(
                "\n## Previous Attempt (failed)\n\n```sql\n{prior_sql}\n```\n\nError: {error}\n\n\
                 Fix the statement so it no longer fails.\n"
            ));
            if error.kind == ExecErrorKind::PermissionDenied {
                user_prompt.push_str(&format!("\n{FORBID_MUTATION_REMINDER}\n"));
            }
        }

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::system(GENERATE_SYSTEM_PROMPT), Message::user(user_prompt)],
            response_format: ResponseFormat::json_object(),
        };

        let content = self.chat_completion(&request).await?;
        let stripped = strip_code_fences(&content);
        let parsed: SqlJson =
            serde_json::from_str(stripped).map_err(|e| CompletionError::JsonParse {
                context: "sql generation".to_owned(),
                source: e,
            })?;

        if let Some(reason) = parsed.refusal {
            return Ok(GeneratedSql::Refusal { reason });
        }

        let Some(raw_sql) = parsed.sql else {
            return Ok(GeneratedSql::Refusal {
                reason: "model returned neither sql nor refusal".to_owned(),
            });
        };

        // Models occasionally fence the SQL inside the JSON string too.
        let sql = strip_code_fences(&raw_sql).trim().to_owned();

        if !is_read_only_statement(&sql) {
            tracing::warn!(sql = %sql, "generated statement failed read-only guard");
            return Ok(GeneratedSql::Refusal {
                reason: format!("generated statement is not a single read-only query: {sql}"),
            });
        }

        Ok(GeneratedSql::Statement {
            sql,
            rationale: parsed.rationale.unwrap_or_default(),
        })
    }
}
