//! Seed-corpus loading.
//!
//! The seed file is a JSON array of question/SQL pairs. Field names are
//! accepted under a few common spellings so existing corpus exports load
//! unchanged.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use sqlagent_core::{Complexity, Example};

#[derive(Debug, Deserialize)]
struct SeedRecord {
    #[serde(alias = "question", alias = "query", alias = "natural_language")]
    natural_language_query: String,
    #[serde(alias = "sql")]
    sql_text: String,
    #[serde(default)]
    tables: Vec<String>,
    #[serde(default)]
    complexity: Option<Complexity>,
}

/// Read a seed file into unembedded examples.
pub fn load_seed_file(path: &Path) -> anyhow::Result<Vec<Example>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed corpus {}", path.display()))?;
    let records: Vec<SeedRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing seed corpus {}", path.display()))?;
    Ok(records
        .into_iter()
        .map(|r| Example {
            natural_language_query: r.natural_language_query,
            sql_text: r.sql_text,
            tables: r.tables,
            complexity: r.complexity.unwrap_or_default(),
            embedding: Vec::new(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_aliased_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(
            &path,
            r#"[
                {"question": "how many users", "sql": "SELECT count(*) FROM users"},
                {"natural_language_query": "all orders", "sql_text": "SELECT * FROM orders",
                 "tables": ["orders"], "complexity": "simple"}
            ]"#,
        )
        .unwrap();

        let examples = load_seed_file(&path).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].natural_language_query, "how many users");
        assert!(examples[0].embedding.is_empty());
        assert_eq!(examples[1].tables, vec!["orders".to_owned()]);
        assert_eq!(examples[1].complexity, Complexity::Simple);
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_seed_file(&path).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }
}
