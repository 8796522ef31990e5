//! Example store and similarity retrieval.
//!
//! Holds the corpus of verified natural-language → SQL pairs with their
//! embeddings, ranks them by cosine similarity for prompt injection, and
//! grows the corpus through the feedback path after successful executions.

mod error;
mod retriever;
mod store;

pub use error::RetrievalError;
pub use retriever::ExampleRetriever;
pub use store::{ExampleStore, RankedExample, cosine_similarity, format_examples_for_prompt};
