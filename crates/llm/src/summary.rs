use sqlagent_core::{ExecutionSuccess, MAX_DISPLAY_ROWS, strip_code_fences, truncate};

use crate::ai_types::{ChatRequest, Message, ResponseFormat, SummaryJson};
use crate::client::CompletionClient;
use crate::error::CompletionError;

impl CompletionClient {
    /// Summarize a successful query result in natural language, in the same
    /// language as the original request.
    ///
    /// # Errors
    /// Returns an error if the completion call fails or returns an
    /// unparsable body.
    pub async fn summarize_result(
        &self,
        utterance: &str,
        sql: &str,
        result: &ExecutionSuccess,
    ) -> Result<String, CompletionError> {
        let sample: String = result
            .rows
            .iter()
            .take(MAX_DISPLAY_ROWS)
            .map(|row| serde_json::Value::Object(row.clone()).to_string())
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            r#"Summarize this query result for the user in 1-3 sentences, in the same language as their request.

User request: {utterance}

SQL executed:
{sql}

Rows returned: {count}
Sample rows:
{sample}

Return JSON: {{"summary": "..."}}"#,
            count = result.row_count,
            sample = truncate(&sample, 2000),
        );

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            response_format: ResponseFormat::json_object(),
        };

        let content = self.chat_completion(&request).await?;
        let stripped = strip_code_fences(&content);
        let parsed: SummaryJson =
            serde_json::from_str(stripped).map_err(|e| CompletionError::JsonParse {
                context: "result summary".to_owned(),
                source: e,
            })?;
        Ok(parsed.summary)
    }
}
