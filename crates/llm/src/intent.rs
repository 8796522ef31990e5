use sqlagent_core::{ConversationTurn, INTENT_CONTEXT_TURNS, Intent, Role, strip_code_fences};

use crate::ai_types::{ChatRequest, IntentJson, Message, ResponseFormat};
use crate::client::CompletionClient;
use crate::error::CompletionError;

/// Result of classifying one user utterance.
#[derive(Debug, Clone)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f64,
    pub reasoning: String,
}

const INTENT_PROMPT: &str = r#"You are an intent classifier for a database assistant.

Intent types:
1. "text_to_sql": the user wants data answered with a SQL query.
   Examples: "Show products with price over 100", "count sales by category"
2. "debug_retry": the user asks to fix or retry a previous query that failed.
   Examples: "try again", "that query was wrong, fix it"
3. "chat": general conversation with no database involvement.
   Examples: "Hello", "what can you do?", "explain what a JOIN is"

Return JSON: {"intent": "text_to_sql|debug_retry|chat", "confidence": 0.0-1.0, "reasoning": "..."}"#;

impl CompletionClient {
    /// Classify a user utterance, given the recent transcript for follow-up
    /// disambiguation.
    ///
    /// Unknown labels map to `Chat` rather than failing: classification is
    /// best-effort by contract. Service-level errors still propagate so the
    /// caller can apply its own fallback.
    ///
    /// # Errors
    /// Returns an error if the completion call fails or returns an
    /// unparsable body.
    pub async fn classify_intent(
        &self,
        utterance: &str,
        transcript: &[ConversationTurn],
    ) -> Result<IntentClassification, CompletionError> {
        let mut messages = vec![Message::system(INTENT_PROMPT)];
        let recent = transcript.len().saturating_sub(INTENT_CONTEXT_TURNS);
        for turn in &transcript[recent..] {
            messages.push(match turn.role {
                Role::User => Message::user(turn.text.clone()),
                Role::Agent => Message::assistant(turn.text.clone()),
            });
        }
        messages.push(Message::user(utterance));

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            response_format: ResponseFormat::json_object(),
        };

        let content = self.chat_completion(&request).await?;
        let stripped = strip_code_fences(&content);
        let parsed: IntentJson =
            serde_json::from_str(stripped).map_err(|e| CompletionError::JsonParse {
                context: "intent classification".to_owned(),
                source: e,
            })?;

        let intent = parsed.intent.parse::<Intent>().unwrap_or_else(|_| {
            tracing::debug!(label = %parsed.intent, "unknown intent label, defaulting to chat");
            Intent::Chat
        });

        Ok(IntentClassification {
            intent,
            confidence: parsed.confidence,
            reasoning: parsed.reasoning,
        })
    }
}
