//! Domain types shared by the routing, retrieval and ingest crates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::metadata::{split_mentions, EntityMap};

pub type ChunkId = String;

/// Metadata attached to every indexed statute fragment.
///
/// - `source`: name of the JSON file the fragment came from
/// - `act_name`: partition key; must equal an `ActDefinition::name`
/// - `page`: page in the source document (defaults to 1)
/// - `article`/`paragraph`: pinpoint assigned by the upstream parser, if any
/// - `articles`/`paragraphs`: comma-joined numbers found in the text by the
///   enricher (see `lexdb-core::metadata` for the scalar encoding)
/// - `entities`: named-entity mentions grouped by label
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub act_name: String,
    pub page: i64,
    pub article: Option<String>,
    pub paragraph: Option<String>,
    pub articles: Option<String>,
    pub paragraphs: Option<String>,
    pub entities: EntityMap,
}

impl ChunkMetadata {
    /// Every entity mention and citation number carried by this chunk, as one
    /// flat set. This is what the entity-aware re-ranker intersects against
    /// the query side.
    pub fn entity_values(&self) -> BTreeSet<String> {
        let mut values = BTreeSet::new();
        for mentions in self.entities.values() {
            values.extend(mentions.iter().cloned());
        }
        for raw in [&self.articles, &self.paragraphs].into_iter().flatten() {
            values.extend(split_mentions(raw));
        }
        values
    }
}

/// A retrievable unit of statute text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatuteChunk {
    pub id: ChunkId,
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// A chunk together with its relevance score; higher is always better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: StatuteChunk,
    pub score: f32,
}

/// Boolean expression tree over metadata equality, pushed down to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataFilter {
    Eq(String, String),
    And(Vec<MetadataFilter>),
    Or(Vec<MetadataFilter>),
}

impl MetadataFilter {
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        MetadataFilter::Eq(key.into(), value.into())
    }
}
