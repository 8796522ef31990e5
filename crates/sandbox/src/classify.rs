//! Failure classification for sandbox executions.

use sqlagent_core::{ErrorRecord, ExecErrorKind};
use sqlx::error::DatabaseError;
use sqlx::mysql::MySqlDatabaseError;

/// Map a MySQL server error number onto the retry taxonomy.
///
/// Anything unrecognized counts as a syntax-class failure: it came from the
/// server rejecting the statement, so regeneration is the right response.
#[must_use]
pub fn classify_mysql_error_number(number: u16) -> ExecErrorKind {
    match number {
        // Parse and malformed-statement errors.
        1064 | 1149 | 1065 => ExecErrorKind::SyntaxError,
        // Unknown table/column/db and ambiguous references.
        1146 | 1051 | 1054 | 1052 | 1049 | 1109 => ExecErrorKind::SchemaMismatch,
        // Access control: denied command, denied table, read-only server.
        1044 | 1045 | 1142 | 1143 | 1227 | 1290 => ExecErrorKind::PermissionDenied,
        // Server-side cancellation deadlines.
        1317 | 3024 => ExecErrorKind::Timeout,
        // Lost connection, server gone away.
        2006 | 2013 => ExecErrorKind::ConnectionError,
        _ => ExecErrorKind::SyntaxError,
    }
}

/// Classify an sqlx failure from one statement execution.
pub(crate) fn classify_sqlx_error(err: &sqlx::Error) -> ErrorRecord {
    match err {
        sqlx::Error::Database(db) => classify_database_error(db.as_ref()),
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_) => {
            ErrorRecord::new(ExecErrorKind::ConnectionError, err.to_string())
        },
        other => ErrorRecord::new(ExecErrorKind::SyntaxError, other.to_string()),
    }
}

fn classify_database_error(db: &dyn DatabaseError) -> ErrorRecord {
    let kind = db
        .try_downcast_ref::<MySqlDatabaseError>()
        .map(|mysql| classify_mysql_error_number(mysql.number()))
        .unwrap_or(ExecErrorKind::SyntaxError);
    ErrorRecord::new(kind, db.message().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_errors() {
        assert_eq!(classify_mysql_error_number(1064), ExecErrorKind::SyntaxError);
    }

    #[test]
    fn test_schema_mismatch() {
        assert_eq!(classify_mysql_error_number(1146), ExecErrorKind::SchemaMismatch);
        assert_eq!(classify_mysql_error_number(1054), ExecErrorKind::SchemaMismatch);
        assert_eq!(classify_mysql_error_number(1052), ExecErrorKind::SchemaMismatch);
    }

    #[test]
    fn test_permission_denied() {
        assert_eq!(classify_mysql_error_number(1142), ExecErrorKind::PermissionDenied);
        assert_eq!(classify_mysql_error_number(1290), ExecErrorKind::PermissionDenied);
    }

    #[test]
    fn test_infrastructure_kinds() {
        assert_eq!(classify_mysql_error_number(2013), ExecErrorKind::ConnectionError);
        assert_eq!(classify_mysql_error_number(3024), ExecErrorKind::Timeout);
    }

    #[test]
    fn test_unknown_number_defaults_to_syntax() {
        assert_eq!(classify_mysql_error_number(9999), ExecErrorKind::SyntaxError);
    }

    #[test]
    fn test_pool_errors_are_connection_faults() {
        let record = classify_sqlx_error(&sqlx::Error::PoolTimedOut);
        assert_eq!(record.kind, ExecErrorKind::ConnectionError);
    }
}
