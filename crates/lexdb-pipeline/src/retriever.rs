//! Filter construction and the staged retrieval fallback.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use lexdb_core::traits::StatuteIndex;
use lexdb_core::types::{MetadataFilter, ScoredChunk};
use lexdb_routing::PinpointRef;

/// How candidates are pulled from the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchMode {
    /// Plain top-k similarity; use when a re-ranker consumes the result.
    Similarity,
    /// Over-fetch `fetch_k`, then balance relevance against variety.
    /// `diversity_weight` in [0, 1]; lower biases toward diversity.
    Diversity { fetch_k: usize, diversity_weight: f32 },
}

/// Which fallback stage produced the result, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStage {
    Pinpoint,
    ActFilter,
    Unfiltered,
}

#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub k: usize,
    pub mode: SearchMode,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self { k: 12, mode: SearchMode::Similarity }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub docs: Vec<ScoredChunk>,
    pub stage: RetrievalStage,
}

/// Partition filter over the routed act names; `None` searches everything.
pub fn act_filter(acts: &[String]) -> Option<MetadataFilter> {
    match acts {
        [] => None,
        [single] => Some(MetadataFilter::eq("act_name", single.clone())),
        many => Some(MetadataFilter::Or(
            many.iter().map(|a| MetadataFilter::eq("act_name", a.clone())).collect(),
        )),
    }
}

/// Conjunction of the act filter with an article pinpoint. A chunk tagged
/// `paragraph = "all"` applies to every paragraph of its article, so it must
/// match a paragraph-specific query too.
pub fn pinpoint_filter(acts: &[String], article: &str, paragraph: Option<&str>) -> MetadataFilter {
    let mut parts = Vec::new();
    if let Some(act) = act_filter(acts) {
        parts.push(act);
    }
    parts.push(MetadataFilter::eq("article", article));
    if let Some(p) = paragraph {
        parts.push(MetadataFilter::Or(vec![
            MetadataFilter::eq("paragraph", p),
            MetadataFilter::eq("paragraph", "all"),
        ]));
    }
    MetadataFilter::And(parts)
}

pub struct CandidateRetriever {
    index: Arc<dyn StatuteIndex>,
    config: RetrieverConfig,
}

impl CandidateRetriever {
    pub fn new(index: Arc<dyn StatuteIndex>, config: RetrieverConfig) -> Self {
        Self { index, config }
    }

    /// Staged retrieval: pinpoint filter first when an act and an article are
    /// both known, act filter (or no filter) otherwise. Each stage issues one
    /// index query with the configured `k`; an empty stage falls through, it
    /// never errors and never retries with a different `k`.
    pub fn retrieve(
        &self,
        query: &str,
        routed_acts: &[String],
        refs: &PinpointRef,
    ) -> Result<RetrievalOutcome> {
        if let Some(article) = refs.article.as_deref() {
            if !routed_acts.is_empty() {
                let filter = pinpoint_filter(routed_acts, article, refs.paragraph.as_deref());
                let docs = self.search(query, Some(&filter))?;
                if !docs.is_empty() {
                    debug!(article, "pinpoint stage hit");
                    return Ok(RetrievalOutcome { docs, stage: RetrievalStage::Pinpoint });
                }
                debug!(article, "pinpoint stage empty, falling back to act filter");
            }
        }

        let filter = act_filter(routed_acts);
        let stage = if filter.is_some() { RetrievalStage::ActFilter } else { RetrievalStage::Unfiltered };
        let docs = self.search(query, filter.as_ref())?;
        Ok(RetrievalOutcome { docs, stage })
    }

    fn search(&self, query: &str, filter: Option<&MetadataFilter>) -> Result<Vec<ScoredChunk>> {
        match self.config.mode {
            SearchMode::Similarity => self.index.similarity_search(query, self.config.k, filter),
            SearchMode::Diversity { fetch_k, diversity_weight } => {
                self.index.diversity_search(query, self.config.k, fetch_k, diversity_weight, filter)
            }
        }
    }
}
