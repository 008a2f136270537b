//! Batched writer for the statute table.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::{connect, Connection};
use lancedb::query::ExecutableQuery;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use arrow_array::{
    FixedSizeListArray, Int64Array, RecordBatch, RecordBatchIterator, StringArray,
};
use futures::TryStreamExt;

use lexdb_core::metadata::{flatten_mentions, EntityLabel};
use lexdb_core::traits::{Embedder, StatuteIndexWriter};
use lexdb_core::types::StatuteChunk;

use crate::schema::{build_arrow_schema, EMBEDDING_DIM};

/// Upper bound on rows per commit; each batch commit is independent, so a
/// failed batch never corrupts previously committed ones.
pub const MAX_WRITE_BATCH: usize = 4000;

pub struct LanceStatuteWriter {
    db: Connection,
    table_name: String,
    embedder: Box<dyn Embedder>,
}

impl LanceStatuteWriter {
    pub async fn new(db_path: &Path, table_name: &str, embedder: Box<dyn Embedder>) -> Result<Self> {
        let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
        Ok(Self { db, table_name: table_name.to_string(), embedder })
    }

    pub async fn index_chunks(&self, chunks: &[StatuteChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
                .expect("progress template")
                .progress_chars("#>-"),
        );
        for batch in chunks.chunks(MAX_WRITE_BATCH) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts)?;
            self.insert_batch(batch, &embeddings).await?;
            pb.inc(batch.len() as u64);
        }
        pb.finish_with_message("indexed");
        Ok(())
    }

    /// Distinct `source` values already present in the table. Empty when the
    /// table has not been created yet.
    pub async fn list_sources(&self) -> Result<BTreeSet<String>> {
        let names = self.db.table_names().execute().await?;
        if !names.contains(&self.table_name) {
            return Ok(BTreeSet::new());
        }
        let table = self.db.open_table(&self.table_name).execute().await?;
        let mut stream = table.query().execute().await?;
        let mut sources = BTreeSet::new();
        while let Some(batch) = TryStreamExt::try_next(&mut stream).await? {
            let col = batch
                .column_by_name("source")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| anyhow::anyhow!("source column missing"))?;
            for i in 0..batch.num_rows() {
                sources.insert(col.value(i).to_string());
            }
        }
        Ok(sources)
    }

    async fn insert_batch(&self, chunks: &[StatuteChunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        assert_eq!(chunks.len(), embeddings.len(), "chunks and embeddings length must match");
        let record_batch = chunks_to_record_batch(chunks, embeddings)?;
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
        if self.db.table_names().execute().await?.contains(&self.table_name) {
            self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
        } else {
            self.db.create_table(&self.table_name, reader).execute().await?;
        }
        Ok(())
    }
}

fn chunks_to_record_batch(chunks: &[StatuteChunk], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
    let schema = build_arrow_schema();
    let mut ids = Vec::new();
    let mut sources = Vec::new();
    let mut act_names = Vec::new();
    let mut pages = Vec::new();
    let mut articles = Vec::new();
    let mut paragraphs = Vec::new();
    let mut article_lists = Vec::new();
    let mut paragraph_lists = Vec::new();
    let mut entity_cols: Vec<Vec<Option<String>>> =
        EntityLabel::ALL.iter().map(|_| Vec::new()).collect();
    let mut contents = Vec::new();
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();

    for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
        let m = &chunk.metadata;
        ids.push(chunk.id.clone());
        sources.push(m.source.clone());
        act_names.push(m.act_name.clone());
        pages.push(m.page);
        articles.push(m.article.clone());
        paragraphs.push(m.paragraph.clone());
        article_lists.push(m.articles.clone());
        paragraph_lists.push(m.paragraphs.clone());
        for (col, label) in entity_cols.iter_mut().zip(EntityLabel::ALL.iter()) {
            let mentions = m.entities.get(label).filter(|s| !s.is_empty());
            col.push(mentions.map(flatten_mentions));
        }
        contents.push(chunk.content.clone());
        vectors.push(Some(embedding.iter().map(|&x| Some(x)).collect()));
    }

    let mut columns: Vec<arrow_array::ArrayRef> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(StringArray::from(sources)),
        Arc::new(StringArray::from(act_names)),
        Arc::new(Int64Array::from(pages)),
        Arc::new(StringArray::from(articles)),
        Arc::new(StringArray::from(paragraphs)),
        Arc::new(StringArray::from(article_lists)),
        Arc::new(StringArray::from(paragraph_lists)),
    ];
    for col in entity_cols {
        columns.push(Arc::new(StringArray::from(col)));
    }
    columns.push(Arc::new(StringArray::from(contents)));
    columns.push(Arc::new(FixedSizeListArray::from_iter_primitive::<
        arrow_array::types::Float32Type,
        _,
        _,
    >(vectors.into_iter(), EMBEDDING_DIM)));

    Ok(RecordBatch::try_new(schema, columns)?)
}

impl StatuteIndexWriter for LanceStatuteWriter {
    fn add_chunks(&self, chunks: &[StatuteChunk]) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async { self.index_chunks(chunks).await })
    }

    fn indexed_sources(&self) -> anyhow::Result<BTreeSet<String>> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async { self.list_sources().await })
    }
}
