//! Similarity and diversity search over the statute table.

use anyhow::Result;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use std::path::Path;
use tracing::debug;

use arrow_array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, StringArray};

use lexdb_core::metadata::{split_mentions, EntityLabel};
use lexdb_core::traits::{Embedder, StatuteIndex};
use lexdb_core::types::{ChunkMetadata, MetadataFilter, ScoredChunk, StatuteChunk};

use crate::filter::to_sql_predicate;

pub struct LanceStatuteSearch {
    db: Connection,
    table_name: String,
    embedder: Box<dyn Embedder>,
}

impl LanceStatuteSearch {
    pub async fn new(db_path: &Path, table_name: &str, embedder: Box<dyn Embedder>) -> Result<Self> {
        let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
        Ok(Self { db, table_name: table_name.to_string(), embedder })
    }

    pub async fn similarity(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredChunk>> {
        let rows = self.fetch(query, k, filter).await?;
        Ok(rows.into_iter().map(|(chunk, _)| chunk).collect())
    }

    /// Over-fetch `fetch_k` candidates, then greedily select `k` balancing
    /// relevance against dissimilarity to already-selected results.
    pub async fn diversity(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
        diversity_weight: f32,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredChunk>> {
        let rows = self.fetch(query, fetch_k.max(k), filter).await?;
        let relevance: Vec<f32> = rows.iter().map(|(c, _)| c.score).collect();
        let vectors: Vec<Vec<f32>> = rows.iter().map(|(_, v)| v.clone()).collect();
        let picked = mmr_select(&relevance, &vectors, k, diversity_weight);
        Ok(picked.into_iter().map(|i| rows[i].0.clone()).collect())
    }

    async fn fetch(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<(ScoredChunk, Vec<f32>)>> {
        let query_vec = self
            .embedder
            .embed_batch(&[query.to_string()])?
            .remove(0);
        let table = self.db.open_table(&self.table_name).execute().await?;
        let mut q = table.vector_search(query_vec)?.limit(k);
        if let Some(f) = filter {
            q = q.only_if(to_sql_predicate(f));
        }
        let mut stream = q.execute().await?;
        let mut rows = Vec::new();
        while let Some(batch) = TryStreamExt::try_next(&mut stream).await? {
            decode_batch(&batch, &mut rows)?;
        }
        debug!(k, rows = rows.len(), filtered = filter.is_some(), "vector search");
        Ok(rows)
    }
}

fn required_str<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow::anyhow!("column {name} missing from statute table"))
}

fn optional_value(col: Option<&StringArray>, i: usize) -> Option<String> {
    col.and_then(|c| if c.is_null(i) { None } else { Some(c.value(i).to_string()) })
}

fn decode_batch(batch: &RecordBatch, rows: &mut Vec<(ScoredChunk, Vec<f32>)>) -> Result<()> {
    let ids = required_str(batch, "id")?;
    let sources = required_str(batch, "source")?;
    let act_names = required_str(batch, "act_name")?;
    let contents = required_str(batch, "content")?;
    let pages = batch
        .column_by_name("page")
        .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
        .ok_or_else(|| anyhow::anyhow!("column page missing from statute table"))?;
    let articles = batch.column_by_name("article").and_then(|c| c.as_any().downcast_ref::<StringArray>());
    let paragraphs = batch.column_by_name("paragraph").and_then(|c| c.as_any().downcast_ref::<StringArray>());
    let article_lists = batch.column_by_name("articles").and_then(|c| c.as_any().downcast_ref::<StringArray>());
    let paragraph_lists = batch.column_by_name("paragraphs").and_then(|c| c.as_any().downcast_ref::<StringArray>());
    let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());
    let vectors = batch.column_by_name("vector").and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>());

    for i in 0..batch.num_rows() {
        let mut metadata = ChunkMetadata {
            source: sources.value(i).to_string(),
            act_name: act_names.value(i).to_string(),
            page: pages.value(i),
            article: optional_value(articles, i),
            paragraph: optional_value(paragraphs, i),
            articles: optional_value(article_lists, i),
            paragraphs: optional_value(paragraph_lists, i),
            ..ChunkMetadata::default()
        };
        for label in EntityLabel::ALL {
            let col = batch
                .column_by_name(label.storage_key())
                .and_then(|c| c.as_any().downcast_ref::<StringArray>());
            if let Some(raw) = optional_value(col, i) {
                let mentions = split_mentions(&raw);
                if !mentions.is_empty() {
                    metadata.entities.insert(label, mentions);
                }
            }
        }
        let score = match distances {
            Some(d) if !d.is_null(i) => 1.0 - d.value(i),
            _ => 0.5,
        };
        let vector = match vectors {
            Some(col) if !col.is_null(i) => col
                .value(i)
                .as_any()
                .downcast_ref::<Float32Array>()
                .map(|v| v.values().to_vec())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        let chunk = StatuteChunk {
            id: ids.value(i).to_string(),
            content: contents.value(i).to_string(),
            metadata,
        };
        rows.push((ScoredChunk { chunk, score }, vector));
    }
    Ok(())
}

/// Greedy maximal-marginal-relevance selection.
///
/// Picks the most relevant candidate first, then repeatedly the candidate
/// maximizing `weight * relevance - (1 - weight) * max_similarity_to_picked`.
/// `weight` 1.0 reproduces pure relevance order; lower values favor variety.
pub fn mmr_select(relevance: &[f32], vectors: &[Vec<f32>], k: usize, weight: f32) -> Vec<usize> {
    let n = relevance.len();
    if n == 0 || k == 0 {
        return Vec::new();
    }
    let weight = weight.clamp(0.0, 1.0);
    let mut picked: Vec<usize> = Vec::new();
    let mut remaining: Vec<usize> = (0..n).collect();

    while picked.len() < k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (pos, &i) in remaining.iter().enumerate() {
            let redundancy = picked
                .iter()
                .map(|&j| cosine(&vectors[i], &vectors[j]))
                .fold(f32::NEG_INFINITY, f32::max);
            let score = if picked.is_empty() {
                relevance[i]
            } else {
                weight * relevance[i] - (1.0 - weight) * redundancy
            };
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }
        picked.push(remaining.remove(best_pos));
    }
    picked
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

impl StatuteIndex for LanceStatuteSearch {
    fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> anyhow::Result<Vec<ScoredChunk>> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async { self.similarity(query, k, filter).await })
    }

    fn diversity_search(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
        diversity_weight: f32,
        filter: Option<&MetadataFilter>,
    ) -> anyhow::Result<Vec<ScoredChunk>> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async { self.diversity(query, k, fetch_k, diversity_weight, filter).await })
    }
}
