use std::sync::Arc;

use sqlagent_core::{Example, estimate_complexity};
use sqlagent_embeddings::EmbeddingProvider;

use crate::error::RetrievalError;
use crate::store::{ExampleStore, RankedExample, format_examples_for_prompt};

/// Embedding-backed facade over the example store.
///
/// Wraps the store with the embedding provider so callers work in utterance
/// space instead of vector space.
pub struct ExampleRetriever {
    store: Arc<ExampleStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for ExampleRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExampleRetriever").field("store", &self.store).finish()
    }
}

impl ExampleRetriever {
    #[must_use]
    pub fn new(store: Arc<ExampleStore>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embeddings }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ExampleStore> {
        &self.store
    }

    /// Top-`k` examples similar to the utterance, filtered to the retrieved
    /// tables. An empty corpus yields an empty list, not an error.
    ///
    /// # Errors
    /// Returns an error if embedding fails or the store lock is poisoned.
    pub async fn similar(
        &self,
        utterance: &str,
        tables: &[String],
        k: usize,
    ) -> Result<Vec<RankedExample>, RetrievalError> {
        if self.store.count()? == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embeddings.embed(utterance).await?;
        self.store.search(&query_embedding, k, tables)
    }

    /// Top-`k` similar examples already rendered for the generation prompt.
    ///
    /// # Errors
    /// Returns an error if embedding fails or the store lock is poisoned.
    pub async fn similar_for_prompt(
        &self,
        utterance: &str,
        tables: &[String],
        k: usize,
    ) -> Result<String, RetrievalError> {
        let hits = self.similar(utterance, tables, k).await?;
        Ok(format_examples_for_prompt(&hits))
    }

    /// Feedback path: embed and append a verified pair after a successful
    /// execution, persisting the corpus.
    ///
    /// # Errors
    /// Returns an error if embedding or persistence fails.
    pub async fn add_verified(
        &self,
        natural_language_query: &str,
        sql_text: &str,
        tables: &[String],
    ) -> Result<(), RetrievalError> {
        let embedding = self.embeddings.embed(natural_language_query).await?;
        let example = Example {
            natural_language_query: natural_language_query.to_owned(),
            sql_text: sql_text.to_owned(),
            tables: tables.to_vec(),
            complexity: estimate_complexity(sql_text),
            embedding,
        };
        self.store.append(example)?;
        tracing::info!(query = natural_language_query, "verified example captured");
        Ok(())
    }

    /// Bulk-seed the store from unembedded examples, embedding in one batch.
    ///
    /// # Errors
    /// Returns an error if embedding fails or the store lock is poisoned.
    pub async fn seed(&self, mut examples: Vec<Example>) -> Result<usize, RetrievalError> {
        let texts: Vec<String> =
            examples.iter().map(|e| e.natural_language_query.clone()).collect();
        let vectors = self.embeddings.embed_batch(&texts).await?;
        for (example, vector) in examples.iter_mut().zip(vectors) {
            example.embedding = vector;
            if example.complexity == sqlagent_core::Complexity::Medium {
                example.complexity = estimate_complexity(&example.sql_text);
            }
        }
        let count = self.store.add_all(examples)?;
        self.store.persist()?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlagent_core::Complexity;
    use sqlagent_embeddings::EmbeddingError;

    /// Deterministic provider: hashes text length into a 2-d vector.
    struct StubEmbeddings;

    #[async_trait::async_trait]
    impl EmbeddingProvider for StubEmbeddings {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let n = text.len() as f32;
            Ok(vec![n, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }
    }

    fn retriever() -> ExampleRetriever {
        ExampleRetriever::new(Arc::new(ExampleStore::new()), Arc::new(StubEmbeddings))
    }

    fn unembedded(nl: &str, sql: &str) -> Example {
        Example {
            natural_language_query: nl.to_owned(),
            sql_text: sql.to_owned(),
            tables: vec![],
            complexity: Complexity::Medium,
            embedding: vec![],
        }
    }

    #[tokio::test]
    async fn test_seed_embeds_and_counts() {
        let r = retriever();
        let added = r
            .seed(vec![unembedded("a", "SELECT 1"), unembedded("bb", "SELECT 2")])
            .await
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(r.store().count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_seed_persists_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        let store = Arc::new(ExampleStore::new().with_persist_path(&path));
        let r = ExampleRetriever::new(store, Arc::new(StubEmbeddings));
        r.seed(vec![unembedded("a", "SELECT 1")]).await.unwrap();

        let reloaded = ExampleStore::load(&path).unwrap();
        assert_eq!(reloaded.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_similar_on_empty_corpus() {
        let r = retriever();
        let hits = r.similar("anything", &[], 3).await.unwrap();
        assert!(hits.is_empty());
        assert!(r.similar_for_prompt("anything", &[], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_verified_tags_complexity() {
        let r = retriever();
        r.add_verified(
            "sales by category",
            "SELECT c.name, SUM(x) FROM a JOIN b ON a.id = b.a_id GROUP BY c.name",
            &["a".to_owned(), "b".to_owned()],
        )
        .await
        .unwrap();
        let hits = r.similar("sales by category", &[], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].example.complexity, Complexity::Medium);
        assert_eq!(hits[0].example.tables, vec!["a".to_owned(), "b".to_owned()]);
    }
}
