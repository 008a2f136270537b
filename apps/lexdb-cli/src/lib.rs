//! Shared wiring for the `lexdb` and `lexdb-batch` binaries.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use lexdb_core::catalog::ActCatalog;
use lexdb_core::config::{expand_path, Config};
use lexdb_core::traits::NullEntityExtractor;
use lexdb_core::types::ScoredChunk;
use lexdb_index::{hash_embedder, LanceStatuteSearch};
use lexdb_pipeline::rerank::LexicalOverlapScorer;
use lexdb_pipeline::{
    PipelineConfig, RetrieverConfig, SanctionConfig, SearchMode, StatutePipeline,
};
use lexdb_routing::{ActClassifier, RoutingConfig};

pub const STATUTE_TABLE: &str = "statutes";

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

pub fn index_dir(config: &Config) -> PathBuf {
    expand_path(config.get_or("data.lancedb_index_dir", "./lexdb_index".to_string()))
}

pub fn docs_dir(config: &Config) -> PathBuf {
    expand_path(config.get_or("data.docs_dir", "./documents".to_string()))
}

fn search_mode(config: &Config) -> SearchMode {
    let mode: String = config.get_or("retrieval.mode", "similarity".to_string());
    match mode.as_str() {
        "diversity" => SearchMode::Diversity {
            fetch_k: config.get_or("retrieval.fetch_k", 40usize),
            diversity_weight: config.get_or("retrieval.diversity_weight", 0.5f32),
        },
        _ => SearchMode::Similarity,
    }
}

/// Wire the full pipeline from configuration. The scorer and entity
/// extractor slots take the built-in stand-ins until external services are
/// configured.
pub fn build_pipeline(config: &Config) -> Result<StatutePipeline> {
    let index_path = index_dir(config);
    let rt = tokio::runtime::Runtime::new()?;
    let search = rt.block_on(async {
        LanceStatuteSearch::new(&index_path, STATUTE_TABLE, hash_embedder()).await
    })?;

    let routing = RoutingConfig {
        theft_threshold: config.get_or("routing.theft_threshold", 800u64),
        ..RoutingConfig::default()
    };
    let classifier = ActClassifier::new(Arc::new(ActCatalog::polish_statutes()), routing);

    let rerank_top_n: usize = config.get_or("rerank.top_n", 4usize);
    let pipeline_config = PipelineConfig {
        max_acts: config.get_or("retrieval.max_acts", 2usize),
        retriever: RetrieverConfig {
            k: config.get_or("retrieval.k", 12usize),
            mode: search_mode(config),
        },
        sanction: SanctionConfig { max_kept: config.get_or("sanction.max_kept", 6usize) },
        rerank_top_n: if rerank_top_n == 0 { None } else { Some(rerank_top_n) },
    };

    Ok(StatutePipeline::new(
        classifier,
        Arc::new(search),
        Some(Arc::new(LexicalOverlapScorer)),
        Arc::new(NullEntityExtractor),
        pipeline_config,
    ))
}

/// One-line-per-field dump of a retrieved document, preview capped.
pub fn print_document(position: usize, doc: &ScoredChunk, max_chars: usize) {
    let m = &doc.chunk.metadata;
    println!("\n--- DOKUMENT #{} ---", position);
    println!("ŹRÓDŁO     : {}", m.source);
    println!("AKT        : {}", m.act_name);
    println!("ARTYKUŁ    : {}", m.article.as_deref().unwrap_or("brak"));
    println!("STRONA     : {}", m.page);
    println!("{}", "-".repeat(90));
    println!("{}", preview(&doc.chunk.content, max_chars));
}

pub fn preview(content: &str, max_chars: usize) -> String {
    let text: String = content.trim().replace('\n', " ");
    let short: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        format!("{short}...")
    } else {
        short
    }
}
