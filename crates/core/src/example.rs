use serde::{Deserialize, Serialize};

/// A verified natural-language → SQL pair used to steer generation.
///
/// The corpus is append-only: seeded at startup and grown by the feedback
/// path after successful executions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub natural_language_query: String,
    pub sql_text: String,
    /// Tables the SQL touches, used for schema-overlap filtering.
    #[serde(default)]
    pub tables: Vec<String>,
    /// Rough difficulty tag, derived from SQL features.
    #[serde(default)]
    pub complexity: Complexity,
    /// Embedding of `natural_language_query`. Empty until embedded.
    #[serde(default)]
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Medium,
    Complex,
}

/// Estimate SQL complexity from its surface features: joins, grouping,
/// subqueries, and set operations each add weight.
#[must_use]
pub fn estimate_complexity(sql: &str) -> Complexity {
    let upper = sql.to_uppercase();
    let mut score = 0_u32;

    let join_count = upper.matches("JOIN").count();
    if join_count > 0 {
        score += 1;
    }
    if join_count > 1 {
        score += 1;
    }
    if upper.contains("GROUP BY") {
        score += 1;
    }
    if upper.contains("HAVING") {
        score += 1;
    }
    if upper.contains("UNION") {
        score += 2;
    }
    // A second SELECT after FROM means a subquery.
    if let Some(from_pos) = upper.find("FROM") {
        if upper[from_pos..].contains("SELECT") {
            score += 2;
        }
    }

    match score {
        0 | 1 => Complexity::Simple,
        2 | 3 => Complexity::Medium,
        _ => Complexity::Complex,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_select() {
        assert_eq!(estimate_complexity("SELECT * FROM products WHERE price > 100"), Complexity::Simple);
    }

    #[test]
    fn test_join_with_grouping_is_medium() {
        let sql = "SELECT c.name, COUNT(*) FROM orders o JOIN customers c ON o.customer_id = c.id GROUP BY c.name";
        assert_eq!(estimate_complexity(sql), Complexity::Medium);
    }

    #[test]
    fn test_union_of_subqueries_is_complex() {
        let sql = "SELECT id FROM (SELECT id FROM a) t UNION SELECT id FROM b GROUP BY id HAVING COUNT(*) > 1";
        assert_eq!(estimate_complexity(sql), Complexity::Complex);
    }
}
