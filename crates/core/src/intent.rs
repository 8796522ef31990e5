use serde::{Deserialize, Serialize};

/// Classified purpose of a user utterance. Emitted once per user turn and
/// immutable afterwards.
///
/// The set is closed on purpose: the Orchestrator handles every variant
/// exhaustively instead of dispatching over an open-ended worker registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// General conversation, no database involvement.
    Chat,
    /// Natural-language request that should become a SQL query.
    TextToSql,
    /// Follow-up asking to fix or retry a previously failed query.
    DebugRetry,
}

impl Intent {
    /// Whether this intent enters the SQL pipeline (retrieval, generation,
    /// execution) as opposed to a plain chat reply.
    #[must_use]
    pub const fn is_sql(self) -> bool {
        matches!(self, Self::TextToSql | Self::DebugRetry)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::TextToSql => "text_to_sql",
            Self::DebugRetry => "debug_retry",
        }
    }
}

impl std::str::FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Self::Chat),
            "text_to_sql" => Ok(Self::TextToSql),
            "debug_retry" | "debug" => Ok(Self::DebugRetry),
            other => Err(format!("unknown intent label: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_labels() {
        assert_eq!("chat".parse::<Intent>().unwrap(), Intent::Chat);
        assert_eq!("text_to_sql".parse::<Intent>().unwrap(), Intent::TextToSql);
        assert_eq!("debug".parse::<Intent>().unwrap(), Intent::DebugRetry);
        assert_eq!("debug_retry".parse::<Intent>().unwrap(), Intent::DebugRetry);
    }

    #[test]
    fn test_parse_unknown_label_fails() {
        assert!("sql_to_text".parse::<Intent>().is_err());
    }

    #[test]
    fn test_sql_intents() {
        assert!(!Intent::Chat.is_sql());
        assert!(Intent::TextToSql.is_sql());
        assert!(Intent::DebugRetry.is_sql());
    }
}
