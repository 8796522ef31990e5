use sqlagent_core::{ConversationTurn, ErrorRecord};

/// The last SQL attempt that failed, kept across requests so a
/// debug-retry follow-up can condition on it.
#[derive(Debug, Clone)]
pub struct FailedQuery {
    /// The natural-language request that produced the failed SQL.
    pub utterance: String,
    pub sql: String,
    pub error: ErrorRecord,
}

/// Cross-request conversation state.
///
/// Unlike `SessionState`, which lives for exactly one request, this spans
/// the whole conversation: the append-only transcript plus the most recent
/// failure for follow-up repair.
#[derive(Debug, Clone, Default)]
pub struct AgentSession {
    pub turns: Vec<ConversationTurn>,
    pub last_failure: Option<FailedQuery>,
}

impl AgentSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(ConversationTurn::user(text));
    }

    pub fn push_agent(&mut self, text: impl Into<String>) {
        self.turns.push(ConversationTurn::agent(text));
    }
}
