use serde::{Deserialize, Serialize};

/// Classification of a failed sandbox execution.
///
/// The kind decides what the retry loop does next: regenerate the SQL,
/// regenerate with a stricter prompt, or give up on infrastructure faults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecErrorKind {
    /// The statement did not parse.
    SyntaxError,
    /// Unknown table or column, or an ambiguous reference.
    SchemaMismatch,
    /// A write was attempted, or the sandbox account lacks the privilege.
    PermissionDenied,
    /// The statement exceeded the per-call execution deadline.
    Timeout,
    /// The sandbox database could not be reached.
    ConnectionError,
}

impl ExecErrorKind {
    /// Whether a fresh generation attempt can plausibly fix this failure.
    /// Infrastructure faults cannot be fixed by rewriting the SQL.
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        matches!(self, Self::SyntaxError | Self::SchemaMismatch | Self::PermissionDenied)
    }

    /// Whether this is an infrastructure fault, retried by re-executing the
    /// same SQL rather than by regenerating it.
    #[must_use]
    pub const fn is_infrastructure(self) -> bool {
        matches!(self, Self::Timeout | Self::ConnectionError)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SyntaxError => "syntax_error",
            Self::SchemaMismatch => "schema_mismatch",
            Self::PermissionDenied => "permission_denied",
            Self::Timeout => "timeout",
            Self::ConnectionError => "connection_error",
        }
    }
}

impl std::fmt::Display for ExecErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An execution failure carried into the next generation attempt as the
/// correction signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorRecord {
    pub kind: ExecErrorKind,
    pub message: String,
}

impl ErrorRecord {
    #[must_use]
    pub fn new(kind: ExecErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        assert!(ExecErrorKind::SyntaxError.is_recoverable());
        assert!(ExecErrorKind::SchemaMismatch.is_recoverable());
        assert!(ExecErrorKind::PermissionDenied.is_recoverable());
        assert!(!ExecErrorKind::Timeout.is_recoverable());
        assert!(!ExecErrorKind::ConnectionError.is_recoverable());
    }

    #[test]
    fn test_infrastructure_kinds() {
        assert!(ExecErrorKind::Timeout.is_infrastructure());
        assert!(ExecErrorKind::ConnectionError.is_infrastructure());
        assert!(!ExecErrorKind::SyntaxError.is_infrastructure());
    }
}
