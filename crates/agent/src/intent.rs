//! Intent classification with heuristic pre-pass and graceful fallback.
//!
//! Contract: never raises. Unclassifiable input, empty input, and service
//! failures all default to `Chat`.

use sqlagent_core::{ConversationTurn, Intent, Role};

use crate::traits::CompletionService;

/// Short follow-up phrases that signal "repair the previous query".
///
/// Heuristic (documented decision): an utterance of at most 40 characters
/// containing one of these phrases, arriving after the agent has already
/// replied at least once, is a debug-retry continuation. Longer utterances
/// go to the model: a similarly-worded but substantive request ("try the
/// same thing for last year's orders") is a fresh TextToSql, and only the
/// model can tell.
const RETRY_PHRASES: [&str; 8] =
    ["try again", "retry", "fix it", "fix that", "still wrong", "再试", "重试", "修复"];

/// Classify one utterance given the prior transcript.
pub async fn classify(
    completion: &dyn CompletionService,
    utterance: &str,
    transcript: &[ConversationTurn],
) -> Intent {
    let trimmed = utterance.trim();
    if trimmed.is_empty() {
        return Intent::Chat;
    }

    if is_retry_phrase(trimmed) && transcript.iter().any(|t| t.role == Role::Agent) {
        return Intent::DebugRetry;
    }

    match completion.classify_intent(trimmed, transcript).await {
        Ok(classification) => {
            tracing::debug!(
                intent = classification.intent.as_str(),
                confidence = classification.confidence,
                "intent classified"
            );
            classification.intent
        },
        Err(e) => {
            // ClassificationDefault: non-fatal by contract.
            tracing::warn!(error = %e, "intent classification failed, defaulting to chat");
            Intent::Chat
        },
    }
}

fn is_retry_phrase(utterance: &str) -> bool {
    if utterance.chars().count() > 40 {
        return false;
    }
    let lower = utterance.to_lowercase();
    RETRY_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_phrase_detection() {
        assert!(is_retry_phrase("try again"));
        assert!(is_retry_phrase("please retry"));
        assert!(is_retry_phrase("再试一次"));
        assert!(!is_retry_phrase("show all orders"));
    }

    #[test]
    fn test_long_utterance_is_not_a_retry_phrase() {
        let long = "try again but this time only include orders from the last quarter of 2025";
        assert!(!is_retry_phrase(long));
    }
}
