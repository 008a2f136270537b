//! Full pipeline against a real on-disk index with the hashing embedder.

use std::sync::Arc;

use tempfile::TempDir;

use lexdb_core::catalog::ActCatalog;
use lexdb_core::traits::NullEntityExtractor;
use lexdb_core::types::{ChunkMetadata, StatuteChunk};
use lexdb_index::{hash_embedder, LanceStatuteSearch, LanceStatuteWriter};
use lexdb_pipeline::rerank::LexicalOverlapScorer;
use lexdb_pipeline::{PipelineConfig, RetrievalStage, StatutePipeline};
use lexdb_routing::{ActClassifier, RoutingConfig};

const TABLE: &str = "statutes";

fn chunk(id: &str, act: &str, article: &str, paragraph: &str, content: &str) -> StatuteChunk {
    StatuteChunk {
        id: id.to_string(),
        content: content.to_string(),
        metadata: ChunkMetadata {
            source: "seed.json".to_string(),
            act_name: act.to_string(),
            page: 1,
            article: Some(article.to_string()),
            paragraph: Some(paragraph.to_string()),
            ..ChunkMetadata::default()
        },
    }
}

fn seed() -> Vec<StatuteChunk> {
    vec![
        chunk(
            "kk:278:1", "Kodeks Karny", "278", "1",
            "Art. 278 § 1. Kto zabiera w celu przywłaszczenia cudzą rzecz ruchomą, podlega karze pozbawienia wolności od 3 miesięcy do lat 5.",
        ),
        chunk(
            "kk:278:all", "Kodeks Karny", "278", "all",
            "Art. 278. Przepisy stosuje się odpowiednio do kradzieży energii oraz karty płatniczej.",
        ),
        chunk(
            "kk:279:1", "Kodeks Karny", "279", "1",
            "Art. 279 § 1. Kto kradnie z włamaniem, podlega karze pozbawienia wolności od roku do lat 10.",
        ),
        chunk(
            "kk:115:def", "Kodeks Karny", "115", "1",
            "Art. 115 § 1. Czynem zabronionym w rozumieniu kodeksu oznacza zachowanie o znamionach określonych w ustawie.",
        ),
        chunk(
            "kw:119:1", "Kodeks wykroczeń", "119", "1",
            "Art. 119 § 1. Kto kradnie rzecz o wartości nieprzekraczającej 800 złotych, podlega karze aresztu, ograniczenia wolności albo grzywny.",
        ),
    ]
}

/// Build the index synchronously; the pipeline itself runs on the test
/// thread so the sync index facade can spin up its own runtime.
fn build_pipeline(tmp: &TempDir) -> StatutePipeline {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let search = rt
        .block_on(async {
            let writer = LanceStatuteWriter::new(tmp.path(), TABLE, hash_embedder()).await?;
            writer.index_chunks(&seed()).await?;
            LanceStatuteSearch::new(tmp.path(), TABLE, hash_embedder()).await
        })
        .expect("index setup");

    let classifier =
        ActClassifier::new(Arc::new(ActCatalog::polish_statutes()), RoutingConfig::default());
    StatutePipeline::new(
        classifier,
        Arc::new(search),
        Some(Arc::new(LexicalOverlapScorer)),
        Arc::new(NullEntityExtractor),
        PipelineConfig::default(),
    )
}

#[test]
fn burglary_penalty_question_returns_only_penalty_chunks() {
    let tmp = TempDir::new().expect("tmp");
    let p = build_pipeline(&tmp);

    let outcome = p.run("Co grozi za kradzież z włamaniem?").expect("run");

    assert_eq!(outcome.routed_acts, vec!["Kodeks Karny"]);
    assert_eq!(outcome.stage, RetrievalStage::ActFilter);
    assert!(outcome.sanction_applied);
    assert!(outcome.grounded);
    assert!(!outcome.docs.is_empty());
    for d in &outcome.docs {
        assert_eq!(d.chunk.metadata.act_name, "Kodeks Karny");
        let text = d.chunk.content.to_lowercase();
        assert!(
            text.contains("karze") || text.contains("grzywn") || text.contains("aresztu"),
            "non-penalty chunk survived: {}",
            d.chunk.id
        );
    }
}

#[test]
fn explicit_citation_hits_the_pinpoint_stage() {
    let tmp = TempDir::new().expect("tmp");
    let p = build_pipeline(&tmp);

    let outcome = p.run("Art. 278 § 1 kodeksu karnego").expect("run");

    assert_eq!(outcome.pinpoint.article.as_deref(), Some("278"));
    assert_eq!(outcome.pinpoint.paragraph.as_deref(), Some("1"));
    assert_eq!(outcome.stage, RetrievalStage::Pinpoint);
    assert!(!outcome.docs.is_empty());
    for d in &outcome.docs {
        assert_eq!(d.chunk.metadata.article.as_deref(), Some("278"));
        let p = d.chunk.metadata.paragraph.as_deref();
        assert!(p == Some("1") || p == Some("all"), "unexpected paragraph {p:?}");
    }
}
