//! Ingestion-time metadata enrichment.
//!
//! Makes articles, paragraphs and entities filterable later: citation numbers
//! found in the chunk text become comma-joined `articles`/`paragraphs`
//! scalars, entity mentions land in the typed entity map. Enrichment never
//! fails a chunk; an extractor error just leaves the entity map empty.

use std::collections::BTreeSet;

use tracing::warn;

use lexdb_core::metadata::flatten_mentions;
use lexdb_core::traits::EntityExtractor;
use lexdb_core::types::StatuteChunk;
use lexdb_routing::{find_articles, find_paragraphs};

pub fn enrich_chunk(chunk: &mut StatuteChunk, extractor: &dyn EntityExtractor) {
    let articles: BTreeSet<String> = find_articles(&chunk.content).into_iter().collect();
    if !articles.is_empty() {
        chunk.metadata.articles = Some(flatten_mentions(&articles));
    }
    let paragraphs: BTreeSet<String> = find_paragraphs(&chunk.content).into_iter().collect();
    if !paragraphs.is_empty() {
        chunk.metadata.paragraphs = Some(flatten_mentions(&paragraphs));
    }

    match extractor.extract(&chunk.content) {
        Ok(entities) => {
            chunk.metadata.entities =
                entities.into_iter().filter(|(_, mentions)| !mentions.is_empty()).collect();
        }
        Err(e) => {
            warn!(chunk = %chunk.id, error = %e, "entity extraction failed, continuing without entities");
        }
    }
}
