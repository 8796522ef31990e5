use sqlagent_core::{ConversationTurn, INTENT_CONTEXT_TURNS, Role};

use crate::ai_types::{ChatRequest, Message};
use crate::client::CompletionClient;
use crate::error::CompletionError;

const CHAT_SYSTEM_PROMPT: &str = r#"You are a helpful database assistant.

You handle general questions and conversation. When relevant, remind the
user you can also turn natural-language questions into SQL queries, run
them against the sandbox database, and fix queries that fail.

Always respond in the same language as the user's input."#;

impl CompletionClient {
    /// Produce a conversational reply for a non-SQL utterance.
    ///
    /// # Errors
    /// Returns an error if the completion call fails.
    pub async fn chat_reply(
        &self,
        utterance: &str,
        transcript: &[ConversationTurn],
    ) -> Result<String, CompletionError> {
        let mut messages = vec![Message::system(CHAT_SYSTEM_PROMPT)];
        let recent = transcript.len().saturating_sub(INTENT_CONTEXT_TURNS);
        for turn in &transcript[recent..] {
            messages.push(match turn.role {
                Role::User => Message::user(turn.text.clone()),
                Role::Agent => Message::assistant(turn.text.clone()),
            });
        }
        messages.push(Message::user(utterance));

        let request =
            ChatRequest { model: self.model.clone(), messages, response_format: None };
        let content = self.chat_completion(&request).await?;
        Ok(content.trim().to_owned())
    }
}
