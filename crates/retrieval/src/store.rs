use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use sqlagent_core::Example;

use crate::error::RetrievalError;

/// A ranked search hit.
#[derive(Debug, Clone)]
pub struct RankedExample {
    pub example: Example,
    pub score: f32,
}

/// In-memory vector index over the example corpus.
///
/// Read-mostly: ranked lookups take the read lock, the feedback path takes
/// the write lock for the append. Readers observe either the pre- or
/// post-append corpus, never a partially written entry. Ties rank by
/// insertion order, so a search is deterministic for a fixed corpus.
#[derive(Debug, Default)]
pub struct ExampleStore {
    examples: RwLock<Vec<Example>>,
    persist_path: Option<PathBuf>,
}

impl ExampleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist appends to `path` (JSON array of examples).
    #[must_use]
    pub fn with_persist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_path = Some(path.into());
        self
    }

    /// Load a corpus file into a fresh store. A missing file yields an
    /// empty store, so first runs need no setup step.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, RetrievalError> {
        let examples = if path.exists() {
            let json = std::fs::read_to_string(path)?;
            serde_json::from_str::<Vec<Example>>(&json)?
        } else {
            Vec::new()
        };
        tracing::info!(count = examples.len(), path = %path.display(), "example corpus loaded");
        Ok(Self { examples: RwLock::new(examples), persist_path: Some(path.to_path_buf()) })
    }

    /// Number of examples currently in the corpus.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn count(&self) -> Result<usize, RetrievalError> {
        Ok(self.examples.read().map_err(|_| RetrievalError::LockPoisoned)?.len())
    }

    /// Append examples without persisting (bulk seeding path).
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn add_all(&self, new_examples: Vec<Example>) -> Result<usize, RetrievalError> {
        let mut guard = self.examples.write().map_err(|_| RetrievalError::LockPoisoned)?;
        guard.extend(new_examples);
        Ok(guard.len())
    }

    /// Append one verified example and persist the corpus if a path is
    /// configured. The append is atomic with respect to concurrent reads.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned or persistence fails.
    pub fn append(&self, example: Example) -> Result<(), RetrievalError> {
        {
            let mut guard = self.examples.write().map_err(|_| RetrievalError::LockPoisoned)?;
            guard.push(example);
        }
        self.persist()
    }

    /// Write the whole corpus to the persist path, if one is configured.
    /// Bulk-seeding uses this once instead of persisting per append.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned or the write fails.
    pub fn persist(&self) -> Result<(), RetrievalError> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let snapshot =
            self.examples.read().map_err(|_| RetrievalError::LockPoisoned)?.clone();
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, json)?;
        tracing::debug!(count = snapshot.len(), path = %path.display(), "corpus persisted");
        Ok(())
    }

    /// Rank the corpus against `query_embedding` by descending cosine
    /// similarity and return the top `k`.
    ///
    /// When `tables` is non-empty, examples that name tables are filtered
    /// to those sharing at least one; examples without table annotations
    /// always pass.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
        tables: &[String],
    ) -> Result<Vec<RankedExample>, RetrievalError> {
        let guard = self.examples.read().map_err(|_| RetrievalError::LockPoisoned)?;

        let mut scored: Vec<(usize, f32)> = guard
            .iter()
            .enumerate()
            .filter(|(_, ex)| table_overlap(ex, tables))
            .map(|(idx, ex)| (idx, cosine_similarity(query_embedding, &ex.embedding)))
            .collect();

        // Descending score, insertion order breaks ties.
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(idx, score)| RankedExample { example: guard[idx].clone(), score })
            .collect())
    }
}

fn table_overlap(example: &Example, tables: &[String]) -> bool {
    if tables.is_empty() || example.tables.is_empty() {
        return true;
    }
    example
        .tables
        .iter()
        .any(|t| tables.iter().any(|q| q.eq_ignore_ascii_case(t)))
}

/// Cosine similarity of two vectors. Mismatched or empty dimensions score
/// zero instead of panicking; the corpus may mix embedding generations.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Render ranked examples as the prompt block the generator consumes.
#[must_use]
pub fn format_examples_for_prompt(examples: &[RankedExample]) -> String {
    if examples.is_empty() {
        return String::new();
    }
    let mut out = String::from("## Similar SQL Examples\n\n");
    for (i, ranked) in examples.iter().enumerate() {
        let ex = &ranked.example;
        out.push_str(&format!("### Example {}\n", i + 1));
        out.push_str(&format!("Query: {}\n", ex.natural_language_query));
        if !ex.tables.is_empty() {
            out.push_str(&format!("Tables: {}\n", ex.tables.join(", ")));
        }
        out.push_str(&format!("```sql\n{}\n```\n\n", ex.sql_text));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlagent_core::Complexity;

    fn example(nl: &str, sql: &str, tables: &[&str], embedding: Vec<f32>) -> Example {
        Example {
            natural_language_query: nl.to_owned(),
            sql_text: sql.to_owned(),
            tables: tables.iter().map(|s| (*s).to_owned()).collect(),
            complexity: Complexity::Simple,
            embedding,
        }
    }

    fn seeded_store() -> ExampleStore {
        let store = ExampleStore::new();
        store
            .add_all(vec![
                example("top products", "SELECT 1", &["products"], vec![1.0, 0.0]),
                example("orders by day", "SELECT 2", &["orders"], vec![0.0, 1.0]),
                example("product count", "SELECT 3", &["products"], vec![0.9, 0.1]),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_search_ranks_by_cosine() {
        let store = seeded_store();
        let hits = store.search(&[1.0, 0.0], 2, &[]).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].example.sql_text, "SELECT 1");
        assert_eq!(hits[1].example.sql_text, "SELECT 3");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_search_is_idempotent() {
        let store = seeded_store();
        let first = store.search(&[0.5, 0.5], 3, &[]).unwrap();
        let second = store.search(&[0.5, 0.5], 3, &[]).unwrap();
        let order =
            |hits: &[RankedExample]| hits.iter().map(|h| h.example.sql_text.clone()).collect::<Vec<_>>();
        assert_eq!(order(&first), order(&second));
    }

    #[test]
    fn test_tie_break_by_insertion_order() {
        let store = ExampleStore::new();
        store
            .add_all(vec![
                example("a", "SELECT a", &[], vec![1.0, 0.0]),
                example("b", "SELECT b", &[], vec![1.0, 0.0]),
            ])
            .unwrap();
        let hits = store.search(&[1.0, 0.0], 2, &[]).unwrap();
        assert_eq!(hits[0].example.sql_text, "SELECT a");
        assert_eq!(hits[1].example.sql_text, "SELECT b");
    }

    #[test]
    fn test_table_filter() {
        let store = seeded_store();
        let hits = store.search(&[0.5, 0.5], 3, &["orders".to_owned()]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].example.sql_text, "SELECT 2");
    }

    #[test]
    fn test_untagged_examples_pass_table_filter() {
        let store = ExampleStore::new();
        store.add_all(vec![example("x", "SELECT x", &[], vec![1.0])]).unwrap();
        let hits = store.search(&[1.0], 1, &["whatever".to_owned()]).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_append_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        let store = ExampleStore::new().with_persist_path(&path);
        store.append(example("q", "SELECT q", &["t"], vec![0.1, 0.2])).unwrap();

        let reloaded = ExampleStore::load(&path).unwrap();
        assert_eq!(reloaded.count().unwrap(), 1);
        let hits = reloaded.search(&[0.1, 0.2], 1, &[]).unwrap();
        assert_eq!(hits[0].example.sql_text, "SELECT q");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExampleStore::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_cosine_mismatched_dims_scores_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_format_for_prompt() {
        let hits = vec![RankedExample {
            example: example("top products", "SELECT 1", &["products"], vec![]),
            score: 0.9,
        }];
        let block = format_examples_for_prompt(&hits);
        assert!(block.contains("## Similar SQL Examples"));
        assert!(block.contains("top products"));
        assert!(block.contains("SELECT 1"));
        assert!(format_examples_for_prompt(&[]).is_empty());
    }
}
