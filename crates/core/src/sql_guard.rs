//! Read-only statement guard.
//!
//! The generator refuses to emit mutating SQL and the sandbox refuses to
//! execute it; both layers call into this module so the two checks agree on
//! what counts as a mutation.

/// Statement verbs that mutate data or schema and are always rejected.
const FORBIDDEN_VERBS: [&str; 10] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "TRUNCATE", "CREATE", "REPLACE", "GRANT",
    "REVOKE",
];

/// Whether `sql` is a single read-oriented statement the sandbox may run.
///
/// Accepts SELECT and the read-only auxiliary verbs (SHOW, DESCRIBE,
/// EXPLAIN, WITH ... SELECT). Multi-statement input is rejected outright:
/// a trailing semicolon is fine, a second statement is not. Separator and
/// keyword scans run on a copy with quoted literals blanked, so string
/// contents like `'a;b'` or `'update later'` cannot trip them.
#[must_use]
pub fn is_read_only_statement(sql: &str) -> bool {
    let masked = mask_literals(sql.trim());
    let mut parts = masked.splitn(2, ';');
    let body = parts.next().unwrap_or("").trim();
    if body.is_empty() {
        return false;
    }
    if let Some(rest) = parts.next() {
        if rest.chars().any(|c| c != ';' && !c.is_whitespace()) {
            return false;
        }
    }

    let upper = body.to_uppercase();
    let first_word = upper.split_whitespace().next().unwrap_or("");
    match first_word {
        "SELECT" | "SHOW" | "DESCRIBE" | "DESC" | "EXPLAIN" => {},
        "WITH" => {
            // CTEs are only allowed when the body is a SELECT.
            if !upper.contains("SELECT") {
                return false;
            }
        },
        _ => return false,
    }

    // A mutating verb anywhere as a standalone word disqualifies the
    // statement even when it opens with SELECT (e.g. SELECT ... INTO).
    !FORBIDDEN_VERBS.iter().any(|verb| contains_word(&upper, verb)) && !contains_word(&upper, "INTO")
}

/// The verb that makes `sql` unsafe, if any. Used for refusal messages.
#[must_use]
pub fn forbidden_verb(sql: &str) -> Option<&'static str> {
    let upper = mask_literals(sql).to_uppercase();
    FORBIDDEN_VERBS.iter().find(|verb| contains_word(&upper, verb)).copied()
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.split(|c: char| !c.is_ascii_alphanumeric() && c != '_').any(|w| w == word)
}

/// Copy of `sql` with the contents of quoted runs (`'...'`, `"..."`,
/// `` `...` ``) replaced by spaces. Handles backslash escapes; a doubled
/// quote reads as close-then-reopen, which masks the same span either way.
fn mask_literals(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in sql.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
                out.push(q);
                continue;
            }
            out.push(' ');
        } else {
            if matches!(ch, '\'' | '"' | '`') {
                quote = Some(ch);
            }
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_allowed() {
        assert!(is_read_only_statement("SELECT * FROM products LIMIT 10"));
        assert!(is_read_only_statement("  select id from orders;  "));
    }

    #[test]
    fn test_cte_select_is_allowed() {
        assert!(is_read_only_statement(
            "WITH top AS (SELECT product_id FROM order_items) SELECT * FROM top"
        ));
    }

    #[test]
    fn test_mutations_are_rejected() {
        assert!(!is_read_only_statement("INSERT INTO t VALUES (1)"));
        assert!(!is_read_only_statement("DELETE FROM t"));
        assert!(!is_read_only_statement("DROP TABLE t"));
        assert!(!is_read_only_statement("UPDATE t SET a = 1"));
    }

    #[test]
    fn test_select_into_is_rejected() {
        assert!(!is_read_only_statement("SELECT * INTO backup FROM t"));
    }

    #[test]
    fn test_multi_statement_is_rejected() {
        assert!(!is_read_only_statement("SELECT 1; DROP TABLE t"));
    }

    #[test]
    fn test_semicolon_inside_string_literal_is_fine() {
        assert!(is_read_only_statement("SELECT * FROM products WHERE name = 'a;b'"));
        assert!(is_read_only_statement("SELECT * FROM products WHERE name = 'a;b';"));
        // Quoted text must not hide a real second statement either.
        assert!(!is_read_only_statement("SELECT 'a;b'; DROP TABLE t"));
    }

    #[test]
    fn test_verb_inside_string_literal_is_fine() {
        assert!(is_read_only_statement("SELECT * FROM notes WHERE body = 'update later'"));
        assert_eq!(forbidden_verb("SELECT * FROM notes WHERE body = 'drop it'"), None);
    }

    #[test]
    fn test_escaped_quote_keeps_literal_closed() {
        assert!(is_read_only_statement("SELECT * FROM products WHERE name = 'a\\';b'"));
        assert!(!is_read_only_statement("SELECT '\\''; DELETE FROM t"));
    }

    #[test]
    fn test_column_named_like_verb_is_fine() {
        // "updated_at" must not trip the UPDATE check.
        assert!(is_read_only_statement("SELECT updated_at FROM orders"));
    }

    #[test]
    fn test_forbidden_verb_reporting() {
        assert_eq!(forbidden_verb("DROP TABLE t"), Some("DROP"));
        assert_eq!(forbidden_verb("SELECT 1"), None);
    }
}
