//! Seams to the external services the pipeline consumes.
//!
//! The encoder, the pairwise scorer (cross-encoder) and the NER service are
//! opaque from the pipeline's point of view; the statute index is queried
//! through [`StatuteIndex`] so retrieval logic never touches the backend
//! directly. Implementations own their deadlines: a timed-out call surfaces
//! as an `Err`, which the caller treats as a service failure.

use crate::metadata::EntityMap;
use crate::types::{MetadataFilter, ScoredChunk, StatuteChunk};

/// Text-to-vector encoder.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Query surface of the statute index.
///
/// `diversity_weight` is in [0, 1]; 1.0 reproduces pure similarity order,
/// lower values trade relevance for variety among the selected results.
pub trait StatuteIndex: Send + Sync {
    fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> anyhow::Result<Vec<ScoredChunk>>;

    fn diversity_search(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
        diversity_weight: f32,
        filter: Option<&MetadataFilter>,
    ) -> anyhow::Result<Vec<ScoredChunk>>;
}

/// Write surface of the statute index, used by ingestion only.
pub trait StatuteIndexWriter: Send + Sync {
    fn add_chunks(&self, chunks: &[StatuteChunk]) -> anyhow::Result<()>;
    /// Distinct `source` values already present, for the re-ingest skip-check.
    fn indexed_sources(&self) -> anyhow::Result<std::collections::BTreeSet<String>>;
}

/// Pairwise relevance scorer: one score per `(query, text)` pair, same order.
pub trait PairScorer: Send + Sync {
    fn score(&self, pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>>;
}

/// Named-entity extraction service.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> anyhow::Result<EntityMap>;
}

/// Extractor for configurations without a NER sidecar; never yields entities.
pub struct NullEntityExtractor;

impl EntityExtractor for NullEntityExtractor {
    fn extract(&self, _text: &str) -> anyhow::Result<EntityMap> {
        Ok(EntityMap::new())
    }
}
