//! Lexical schema retrieval.
//!
//! Selects the smallest catalog subset relevant to an utterance. Tables
//! explicitly named always make the cut; otherwise name, column, and
//! comment token overlap decide. Empty retrieval is a defect, not a valid
//! terminal state, so a catalog with no scoring tables falls back to the
//! first N and only an empty catalog aborts the request.

use sqlagent_core::{SCHEMA_FALLBACK_TABLES, SchemaCatalog, SchemaFragment, tokenize};

/// Score weights: explicit table mention dominates, then table-name token
/// match, column match, comment match.
const EXPLICIT_MENTION: u32 = 100;
const NAME_MATCH: u32 = 3;
const COLUMN_MATCH: u32 = 2;
const COMMENT_MATCH: u32 = 1;

/// Select the relevant schema subset, deduplicated by table name and
/// ordered by descending relevance.
///
/// Returns `None` only when the catalog itself is empty
/// (`SchemaRetrievalEmpty`); the orchestrator maps that to a clarification
/// reply instead of feeding the generator an empty schema.
#[must_use]
pub fn retrieve_schema(utterance: &str, catalog: &SchemaCatalog) -> Option<Vec<SchemaFragment>> {
    if catalog.is_empty() {
        return None;
    }

    let lower = utterance.to_lowercase();
    let tokens = tokenize(utterance);

    let mut scored: Vec<(u32, &SchemaFragment)> = catalog
        .fragments()
        .iter()
        .map(|fragment| (score_fragment(fragment, &lower, &tokens), fragment))
        .collect();

    // Catalog order breaks score ties, so retrieval is deterministic.
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let matched: Vec<SchemaFragment> =
        scored.iter().filter(|(score, _)| *score > 0).map(|(_, f)| (*f).clone()).collect();

    if matched.is_empty() {
        // No lexical signal: fall back to the first N catalog tables.
        return Some(
            catalog.fragments().iter().take(SCHEMA_FALLBACK_TABLES).cloned().collect(),
        );
    }
    Some(matched)
}

fn score_fragment(fragment: &SchemaFragment, utterance_lower: &str, tokens: &[String]) -> u32 {
    let table_lower = fragment.table_name.to_lowercase();
    let mut score = 0;

    if utterance_lower.contains(&table_lower) {
        score += EXPLICIT_MENTION;
    }

    let name_tokens = tokenize(&fragment.table_name);
    let comment_tokens = tokenize(&fragment.comment);
    let column_names: Vec<String> =
        fragment.columns.iter().map(|c| c.name.to_lowercase()).collect();

    for token in tokens {
        if name_tokens.iter().any(|n| stem_match(n, token)) {
            score += NAME_MATCH;
        }
        if column_names.iter().any(|c| stem_match(c, token)) {
            score += COLUMN_MATCH;
        }
        if comment_tokens.iter().any(|c| c == token) {
            score += COMMENT_MATCH;
        }
    }
    score
}

/// Token equality tolerant of trivial English plurals, so "order" finds
/// the `orders` table and vice versa.
fn stem_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    a.strip_suffix('s').is_some_and(|stem| stem == b)
        || b.strip_suffix('s').is_some_and(|stem| stem == a)
}
