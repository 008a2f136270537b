//! Cross-encoder re-ranking with an entity-overlap variant.
//!
//! The scorer is an external pairwise service. Its failure degrades this
//! stage to an empty result; the caller keeps its pre-rerank ordering and
//! reports the degradation. The entity-aware variant, by contrast, falls
//! back to the plain top-N when no candidate shares an entity with the
//! query: re-ranking refines relevance, it is not a grounding gate like the
//! sanction filter.

use std::collections::BTreeSet;

use tracing::warn;

use lexdb_core::traits::{EntityExtractor, PairScorer};
use lexdb_core::types::ScoredChunk;
use lexdb_routing::{find_articles, find_paragraphs};

/// Pool the base re-rank is widened to before entity filtering.
const RERANK_POOL: usize = 20;

/// Re-score `docs` against `query` and keep the best `top_n`.
///
/// Documents with blank content are dropped before scoring. Any scorer
/// failure yields an empty result; callers treat that as "no re-ranking
/// available" and keep their previous ordering.
pub fn rerank(
    scorer: &dyn PairScorer,
    query: &str,
    docs: Vec<ScoredChunk>,
    top_n: usize,
) -> Vec<ScoredChunk> {
    if docs.is_empty() || query.trim().is_empty() {
        return Vec::new();
    }

    let valid: Vec<ScoredChunk> =
        docs.into_iter().filter(|d| !d.chunk.content.trim().is_empty()).collect();
    if valid.is_empty() {
        return Vec::new();
    }

    let pairs: Vec<(String, String)> =
        valid.iter().map(|d| (query.to_string(), d.chunk.content.clone())).collect();
    let scores = match scorer.score(&pairs) {
        Ok(scores) if scores.len() == pairs.len() => scores,
        Ok(scores) => {
            warn!(expected = pairs.len(), got = scores.len(), "scorer returned wrong arity");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "scoring service failed, re-ranking unavailable");
            return Vec::new();
        }
    };

    let mut rescored: Vec<ScoredChunk> = valid
        .into_iter()
        .zip(scores)
        .map(|(doc, score)| ScoredChunk { chunk: doc.chunk, score })
        .collect();
    rescored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    rescored.truncate(top_n);
    rescored
}

/// Entity-aware re-ranking: boost documents sharing entities or citation
/// numbers with the query.
pub fn rerank_with_entities(
    scorer: &dyn PairScorer,
    extractor: &dyn EntityExtractor,
    query: &str,
    docs: Vec<ScoredChunk>,
    top_n: usize,
) -> Vec<ScoredChunk> {
    let query_values = query_entity_values(extractor, query);

    let mut sorted = rerank(scorer, query, docs, RERANK_POOL.max(top_n));
    if query_values.is_empty() {
        sorted.truncate(top_n);
        return sorted;
    }

    let mut matched = Vec::new();
    for doc in &sorted {
        if !doc.chunk.metadata.entity_values().is_disjoint(&query_values) {
            matched.push(doc.clone());
            if matched.len() >= top_n {
                break;
            }
        }
    }

    // No candidate shares an entity with the query: keep the plain top-N
    // rather than returning nothing.
    if matched.is_empty() {
        sorted.truncate(top_n);
        return sorted;
    }
    matched
}

/// Entity mentions and citation numbers present in the query text. An
/// extractor failure degrades to citations only.
fn query_entity_values(extractor: &dyn EntityExtractor, query: &str) -> BTreeSet<String> {
    let mut values: BTreeSet<String> = match extractor.extract(query) {
        Ok(map) => map.into_values().flatten().collect(),
        Err(e) => {
            warn!(error = %e, "entity service failed, using citation numbers only");
            BTreeSet::new()
        }
    };
    values.extend(find_articles(query));
    values.extend(find_paragraphs(query));
    values
}

/// Query-term overlap scorer: the share of query words appearing in the
/// document text. Stands in when no cross-encoder service is wired.
pub struct LexicalOverlapScorer;

impl PairScorer for LexicalOverlapScorer {
    fn score(&self, pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>> {
        Ok(pairs
            .iter()
            .map(|(query, text)| {
                let text = text.to_lowercase();
                let words: Vec<String> =
                    query.to_lowercase().split_whitespace().map(str::to_string).collect();
                if words.is_empty() {
                    return 0.0;
                }
                let hits = words.iter().filter(|w| text.contains(w.as_str())).count();
                hits as f32 / words.len() as f32
            })
            .collect())
    }
}
