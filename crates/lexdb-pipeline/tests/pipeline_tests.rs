use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use lexdb_core::catalog::ActCatalog;
use lexdb_core::metadata::{EntityLabel, EntityMap};
use lexdb_core::traits::{
    EntityExtractor, NullEntityExtractor, PairScorer, StatuteIndex,
};
use lexdb_core::types::{ChunkMetadata, MetadataFilter, ScoredChunk, StatuteChunk};
use lexdb_pipeline::rerank::{rerank, rerank_with_entities, LexicalOverlapScorer};
use lexdb_pipeline::{
    filter_sanctions, CandidateRetriever, PipelineConfig, RetrievalStage, RetrieverConfig,
    SanctionConfig, StatutePipeline,
};
use lexdb_routing::{extract_refs, ActClassifier, RoutingConfig};

fn doc(id: &str, act: &str, content: &str) -> ScoredChunk {
    ScoredChunk {
        chunk: StatuteChunk {
            id: id.to_string(),
            content: content.to_string(),
            metadata: ChunkMetadata {
                source: "test.json".to_string(),
                act_name: act.to_string(),
                page: 1,
                ..ChunkMetadata::default()
            },
        },
        score: 0.5,
    }
}

/// Index stub that replays canned responses and records received filters.
struct StubIndex {
    responses: Mutex<VecDeque<Vec<ScoredChunk>>>,
    calls: Mutex<Vec<Option<MetadataFilter>>>,
}

impl StubIndex {
    fn new(responses: Vec<Vec<ScoredChunk>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Option<MetadataFilter>> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn next_response(&self, filter: Option<&MetadataFilter>) -> Vec<ScoredChunk> {
        self.calls.lock().expect("calls lock").push(filter.cloned());
        self.responses.lock().expect("responses lock").pop_front().unwrap_or_default()
    }
}

impl StatuteIndex for StubIndex {
    fn similarity_search(
        &self,
        _query: &str,
        _k: usize,
        filter: Option<&MetadataFilter>,
    ) -> anyhow::Result<Vec<ScoredChunk>> {
        Ok(self.next_response(filter))
    }

    fn diversity_search(
        &self,
        _query: &str,
        _k: usize,
        _fetch_k: usize,
        _diversity_weight: f32,
        filter: Option<&MetadataFilter>,
    ) -> anyhow::Result<Vec<ScoredChunk>> {
        Ok(self.next_response(filter))
    }
}

fn retriever(index: Arc<StubIndex>) -> CandidateRetriever {
    CandidateRetriever::new(index, RetrieverConfig::default())
}

// ---------------------------------------------------------------------------
// Staged fallback
// ---------------------------------------------------------------------------

#[test]
fn pinpoint_stage_hit_issues_single_query() {
    let index = Arc::new(StubIndex::new(vec![vec![doc("kk:278", "Kodeks Karny", "Art. 278")]]));
    let r = retriever(index.clone());

    let refs = extract_refs("Art. 278 § 1 kodeksu karnego");
    let outcome =
        r.retrieve("Art. 278 § 1 kodeksu karnego", &["Kodeks Karny".to_string()], &refs).expect("retrieve");

    assert_eq!(outcome.stage, RetrievalStage::Pinpoint);
    let calls = index.calls();
    assert_eq!(calls.len(), 1);
    let expected = MetadataFilter::And(vec![
        MetadataFilter::eq("act_name", "Kodeks Karny"),
        MetadataFilter::eq("article", "278"),
        MetadataFilter::Or(vec![
            MetadataFilter::eq("paragraph", "1"),
            MetadataFilter::eq("paragraph", "all"),
        ]),
    ]);
    assert_eq!(calls[0].as_ref(), Some(&expected));
}

#[test]
fn empty_pinpoint_stage_falls_back_to_act_filter() {
    let index = Arc::new(StubIndex::new(vec![
        vec![],
        vec![doc("kk:1", "Kodeks Karny", "przepis")],
    ]));
    let r = retriever(index.clone());

    let refs = extract_refs("art. 999 kodeksu karnego");
    let outcome =
        r.retrieve("art. 999 kodeksu karnego", &["Kodeks Karny".to_string()], &refs).expect("retrieve");

    assert_eq!(outcome.stage, RetrievalStage::ActFilter);
    assert_eq!(outcome.docs.len(), 1);
    let calls = index.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], Some(MetadataFilter::And(_))));
    assert_eq!(calls[1].as_ref(), Some(&MetadataFilter::eq("act_name", "Kodeks Karny")));
}

#[test]
fn article_without_routed_act_skips_pinpoint_stage() {
    let index = Arc::new(StubIndex::new(vec![vec![doc("x", "Kodeks cywilny", "przepis")]]));
    let r = retriever(index.clone());

    let refs = extract_refs("co mówi art. 415?");
    let outcome = r.retrieve("co mówi art. 415?", &[], &refs).expect("retrieve");

    assert_eq!(outcome.stage, RetrievalStage::Unfiltered);
    assert_eq!(index.calls(), vec![None]);
}

#[test]
fn multiple_routed_acts_become_an_or_filter() {
    let index = Arc::new(StubIndex::new(vec![vec![doc("x", "Kodeks Karny", "przepis")]]));
    let r = retriever(index.clone());

    let acts = vec!["Kodeks Karny".to_string(), "Kodeks wykroczeń".to_string()];
    let outcome = r.retrieve("kradzież za 500 zł", &acts, &extract_refs("kradzież za 500 zł"))
        .expect("retrieve");

    assert_eq!(outcome.stage, RetrievalStage::ActFilter);
    let expected = MetadataFilter::Or(vec![
        MetadataFilter::eq("act_name", "Kodeks Karny"),
        MetadataFilter::eq("act_name", "Kodeks wykroczeń"),
    ]);
    assert_eq!(index.calls(), vec![Some(expected)]);
}

// ---------------------------------------------------------------------------
// Sanction post-filter
// ---------------------------------------------------------------------------

const PENALTY_TEXT: &str =
    "Kto kradnie z włamaniem, podlega karze pozbawienia wolności od roku do lat 10.";
const DEFINITION_TEXT: &str =
    "Rzeczą ruchomą w rozumieniu niniejszego kodeksu oznacza także energię.";
const PROCEDURAL_TEXT: &str = "Postępowanie wszczyna się na wniosek pokrzywdzonego.";

#[test]
fn sanction_filter_keeps_only_penalty_bearing_docs() {
    let docs = vec![
        doc("d1", "Kodeks Karny", DEFINITION_TEXT),
        doc("d2", "Kodeks Karny", PENALTY_TEXT),
        doc("d3", "Kodeks Karny", PROCEDURAL_TEXT),
    ];
    let kept = filter_sanctions("co grozi za kradzież z włamaniem?", docs, &SanctionConfig::default());
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].chunk.id, "d2");
}

#[test]
fn sanction_filter_fails_closed_on_no_match() {
    let docs = vec![
        doc("d1", "Kodeks Karny", DEFINITION_TEXT),
        doc("d2", "Kodeks Karny", PROCEDURAL_TEXT),
    ];
    let kept = filter_sanctions("jaka kara za paserstwo?", docs, &SanctionConfig::default());
    assert!(kept.is_empty(), "unsupported sanction question must yield nothing");
}

#[test]
fn non_sanction_query_passes_through_untouched() {
    let docs = vec![doc("d1", "Kodeks cywilny", DEFINITION_TEXT)];
    let kept = filter_sanctions("czym jest rzecz ruchoma?", docs.clone(), &SanctionConfig::default());
    assert_eq!(kept.len(), docs.len());
    assert_eq!(kept[0].chunk.id, "d1");
}

#[test]
fn sanction_filter_respects_the_cap() {
    let docs: Vec<ScoredChunk> =
        (0..10).map(|i| doc(&format!("d{i}"), "Kodeks Karny", PENALTY_TEXT)).collect();
    let kept = filter_sanctions("co grozi za rozbój?", docs, &SanctionConfig { max_kept: 3 });
    assert_eq!(kept.len(), 3);
    // Equal scores: retrieval order is preserved.
    assert_eq!(kept[0].chunk.id, "d0");
}

// ---------------------------------------------------------------------------
// Re-ranking
// ---------------------------------------------------------------------------

struct FailingScorer;
impl PairScorer for FailingScorer {
    fn score(&self, _pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>> {
        anyhow::bail!("cross-encoder timed out")
    }
}

/// Scores by the number at the end of the document text, for ordering tests.
struct TrailingNumberScorer;
impl PairScorer for TrailingNumberScorer {
    fn score(&self, pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>> {
        Ok(pairs
            .iter()
            .map(|(_, text)| {
                text.split_whitespace().last().and_then(|w| w.parse().ok()).unwrap_or(0.0)
            })
            .collect())
    }
}

#[test]
fn rerank_orders_by_scorer_and_truncates() {
    let docs = vec![
        doc("a", "Kodeks Karny", "przepis 1"),
        doc("b", "Kodeks Karny", "przepis 9"),
        doc("c", "Kodeks Karny", "przepis 5"),
    ];
    let ranked = rerank(&TrailingNumberScorer, "pytanie", docs, 2);
    let ids: Vec<&str> = ranked.iter().map(|d| d.chunk.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c"]);
    assert_eq!(ranked[0].score, 9.0);
}

#[test]
fn rerank_drops_blank_documents() {
    let docs = vec![doc("a", "Kodeks Karny", "   "), doc("b", "Kodeks Karny", "przepis 2")];
    let ranked = rerank(&TrailingNumberScorer, "pytanie", docs, 5);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].chunk.id, "b");
}

#[test]
fn scorer_failure_degrades_to_empty() {
    let docs = vec![doc("a", "Kodeks Karny", "przepis")];
    assert!(rerank(&FailingScorer, "pytanie", docs, 4).is_empty());
}

struct PersonExtractor;
impl EntityExtractor for PersonExtractor {
    fn extract(&self, text: &str) -> anyhow::Result<EntityMap> {
        let mut map = EntityMap::new();
        if text.contains("Kowalski") {
            map.entry(EntityLabel::Person).or_default().insert("Kowalski".to_string());
        }
        Ok(map)
    }
}

fn doc_with_person(id: &str, content: &str, person: Option<&str>) -> ScoredChunk {
    let mut d = doc(id, "Kodeks Karny", content);
    if let Some(p) = person {
        d.chunk.metadata.entities.entry(EntityLabel::Person).or_default().insert(p.to_string());
    }
    d
}

#[test]
fn entity_rerank_keeps_only_overlapping_docs() {
    let docs = vec![
        doc_with_person("a", "wyrok 9", None),
        doc_with_person("b", "wyrok 5", Some("Kowalski")),
        doc_with_person("c", "wyrok 7", Some("Nowak")),
    ];
    let ranked = rerank_with_entities(&TrailingNumberScorer, &PersonExtractor, "sprawa Kowalski", docs, 2);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].chunk.id, "b");
}

#[test]
fn entity_rerank_falls_open_when_nothing_overlaps() {
    // The asymmetry pin: unlike the sanction gate, entity filtering falls
    // back to the plain top-N instead of returning nothing.
    let docs = vec![
        doc_with_person("a", "wyrok 9", Some("Nowak")),
        doc_with_person("b", "wyrok 5", None),
    ];
    let ranked = rerank_with_entities(&TrailingNumberScorer, &PersonExtractor, "sprawa Kowalski", docs, 2);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].chunk.id, "a");
}

#[test]
fn entity_rerank_without_query_entities_is_plain_top_n() {
    let docs = vec![
        doc_with_person("a", "wyrok 1", Some("Nowak")),
        doc_with_person("b", "wyrok 8", None),
        doc_with_person("c", "wyrok 4", None),
    ];
    let ranked =
        rerank_with_entities(&TrailingNumberScorer, &NullEntityExtractor, "zwykłe pytanie", docs, 2);
    let ids: Vec<&str> = ranked.iter().map(|d| d.chunk.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c"]);
}

#[test]
fn citation_numbers_count_as_query_entities() {
    let mut with_citation = doc("a", "Kodeks Karny", "przepis 3");
    with_citation.chunk.metadata.articles = Some("278, 279".to_string());
    let docs = vec![doc("b", "Kodeks Karny", "przepis 9"), with_citation];

    let ranked =
        rerank_with_entities(&TrailingNumberScorer, &NullEntityExtractor, "co mówi art. 278?", docs, 1);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].chunk.id, "a");
}

// ---------------------------------------------------------------------------
// Composed pipeline
// ---------------------------------------------------------------------------

fn pipeline(index: Arc<StubIndex>, scorer: Option<Arc<dyn PairScorer>>) -> StatutePipeline {
    let classifier =
        ActClassifier::new(Arc::new(ActCatalog::polish_statutes()), RoutingConfig::default());
    StatutePipeline::new(
        classifier,
        index,
        scorer,
        Arc::new(NullEntityExtractor),
        PipelineConfig::default(),
    )
}

#[test]
fn ungrounded_sanction_question_is_flagged() {
    let index = Arc::new(StubIndex::new(vec![vec![
        doc("d1", "Kodeks Karny", DEFINITION_TEXT),
        doc("d2", "Kodeks Karny", PROCEDURAL_TEXT),
    ]]));
    let p = pipeline(index, Some(Arc::new(LexicalOverlapScorer)));

    let outcome = p.run("co grozi za kradzież z włamaniem?").expect("run");
    assert!(outcome.sanction_applied);
    assert!(outcome.docs.is_empty());
    assert!(!outcome.grounded, "empty sanction result must surface as ungrounded");
}

#[test]
fn scorer_failure_keeps_pre_rerank_order() {
    let docs: Vec<ScoredChunk> =
        (0..6).map(|i| doc(&format!("d{i}"), "Kodeks Karny", PENALTY_TEXT)).collect();
    let index = Arc::new(StubIndex::new(vec![docs]));
    let p = pipeline(index, Some(Arc::new(FailingScorer)));

    let outcome = p.run("co grozi za kradzież z włamaniem?").expect("run");
    assert!(!outcome.reranked);
    assert!(!outcome.docs.is_empty());
    assert_eq!(outcome.docs[0].chunk.id, "d0");
}
