#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! The retrieval pipeline: act routing, staged candidate retrieval, sanction
//! post-filtering and optional re-ranking, composed into one query path.

pub mod rerank;
pub mod retriever;
pub mod sanction;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use lexdb_core::traits::{EntityExtractor, PairScorer, StatuteIndex};
use lexdb_core::types::ScoredChunk;
use lexdb_routing::{extract_refs, ActClassifier, PinpointRef};

pub use retriever::{
    act_filter, pinpoint_filter, CandidateRetriever, RetrievalStage, RetrieverConfig, SearchMode,
};
pub use sanction::{filter_sanctions, is_sanction_query, SanctionConfig};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_acts: usize,
    pub retriever: RetrieverConfig,
    pub sanction: SanctionConfig,
    /// When set, candidates are re-ranked down to this many documents.
    pub rerank_top_n: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_acts: 2,
            retriever: RetrieverConfig::default(),
            sanction: SanctionConfig::default(),
            rerank_top_n: Some(4),
        }
    }
}

/// Everything the answer-generation step needs, plus diagnostics.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Final relevance order; the grounding context for generation.
    pub docs: Vec<ScoredChunk>,
    pub routed_acts: Vec<String>,
    pub pinpoint: PinpointRef,
    pub stage: RetrievalStage,
    pub sanction_applied: bool,
    pub reranked: bool,
    /// False when the sanction gate fired and nothing survived; the caller
    /// must surface "no basis found in context" instead of answering.
    pub grounded: bool,
}

pub struct StatutePipeline {
    classifier: ActClassifier,
    retriever: CandidateRetriever,
    scorer: Option<Arc<dyn PairScorer>>,
    extractor: Arc<dyn EntityExtractor>,
    config: PipelineConfig,
}

impl StatutePipeline {
    pub fn new(
        classifier: ActClassifier,
        index: Arc<dyn StatuteIndex>,
        scorer: Option<Arc<dyn PairScorer>>,
        extractor: Arc<dyn EntityExtractor>,
        config: PipelineConfig,
    ) -> Self {
        let retriever = CandidateRetriever::new(index, config.retriever.clone());
        Self { classifier, retriever, scorer, extractor, config }
    }

    /// Run the full pipeline for one query. Classification and reference
    /// extraction are independent; they run back to back here because both
    /// are sub-microsecond next to the index round-trip.
    pub fn run(&self, query: &str) -> Result<PipelineOutcome> {
        let routed_acts = self.classifier.classify(query, self.config.max_acts);
        let pinpoint = extract_refs(query);
        debug!(?routed_acts, ?pinpoint, "routing");

        let retrieved = self.retriever.retrieve(query, &routed_acts, &pinpoint)?;
        let stage = retrieved.stage;

        let sanction_applied = is_sanction_query(query);
        let mut docs = filter_sanctions(query, retrieved.docs, &self.config.sanction);
        let grounded = !(sanction_applied && docs.is_empty());

        let mut reranked = false;
        if let (Some(top_n), Some(scorer)) = (self.config.rerank_top_n, self.scorer.as_deref()) {
            if docs.len() > top_n {
                let refined = rerank::rerank_with_entities(
                    scorer,
                    self.extractor.as_ref(),
                    query,
                    docs.clone(),
                    top_n,
                );
                if refined.is_empty() {
                    warn!("re-ranking unavailable, keeping pre-rerank order");
                } else {
                    docs = refined;
                    reranked = true;
                }
            }
        }

        Ok(PipelineOutcome {
            docs,
            routed_acts,
            pinpoint,
            stage,
            sanction_applied,
            reranked,
            grounded,
        })
    }
}
