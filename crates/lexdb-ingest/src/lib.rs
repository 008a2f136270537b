#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Batch ingestion of statute source files into the index.
//!
//! Ingestion runs separately from serving. Already-indexed source files are
//! skipped (idempotent by skip-check, not rollback); a file that fails to
//! load is logged and skipped while the run continues; an entirely empty
//! load is fatal because there is nothing meaningful to index.

pub mod enrich;
pub mod loader;

use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};
use walkdir::WalkDir;

use lexdb_core::error::Error;
use lexdb_core::traits::{EntityExtractor, StatuteIndexWriter};
use lexdb_core::types::StatuteChunk;

use crate::loader::{chunk_text, load_source_file, ChunkingConfig};

#[derive(Debug, Default, Clone)]
pub struct IngestReport {
    pub files_found: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub files_ingested: usize,
    pub chunks_indexed: usize,
}

/// Ingest every new `.json` source under `docs_dir`.
pub fn run_ingest(
    docs_dir: &Path,
    writer: &dyn StatuteIndexWriter,
    extractor: &dyn EntityExtractor,
    chunking: &ChunkingConfig,
) -> Result<IngestReport> {
    let mut files = list_json_files(docs_dir);
    files.sort();
    let existing = writer.indexed_sources()?;

    let mut report = IngestReport { files_found: files.len(), ..IngestReport::default() };
    if files.is_empty() && existing.is_empty() {
        return Err(Error::NoDocuments.into());
    }

    let mut chunks: Vec<StatuteChunk> = Vec::new();
    let mut attempted = 0usize;
    for path in &files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if existing.contains(&filename) {
            report.files_skipped += 1;
            continue;
        }
        attempted += 1;
        let records = match load_source_file(path) {
            Ok(records) => records,
            Err(e) => {
                warn!(file = %filename, error = %e, "skipping unreadable source file");
                report.files_failed += 1;
                continue;
            }
        };
        let stem = filename.trim_end_matches(".json");
        let mut chunk_index = 0usize;
        for record in records {
            for piece in chunk_text(&record.content, chunking) {
                let mut chunk = StatuteChunk {
                    id: format!("{}:{}", stem, chunk_index),
                    content: piece,
                    metadata: record.metadata.clone(),
                };
                enrich::enrich_chunk(&mut chunk, extractor);
                chunks.push(chunk);
                chunk_index += 1;
            }
        }
        report.files_ingested += 1;
    }

    if attempted > 0 && chunks.is_empty() {
        return Err(Error::NoDocuments.into());
    }
    if chunks.is_empty() {
        info!("index is up to date, nothing to ingest");
        return Ok(report);
    }

    writer.add_chunks(&chunks)?;
    report.chunks_indexed = chunks.len();
    info!(
        files = report.files_ingested,
        skipped = report.files_skipped,
        chunks = report.chunks_indexed,
        "ingest complete"
    );
    Ok(report)
}

fn list_json_files(root: &Path) -> Vec<std::path::PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .map(|e| e.path().to_path_buf())
        .collect()
}
