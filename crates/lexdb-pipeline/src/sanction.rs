//! Post-filter gating sanction questions on penalty-bearing text.
//!
//! When the user asks what a deed is punished with, only provisions that
//! actually carry a sanction may ground the answer. If none of the
//! candidates do, the filter returns an empty list on purpose: the generator
//! then reports missing grounding instead of deriving a penalty from
//! procedural or definitional text.

use tracing::debug;

use lexdb_core::types::ScoredChunk;

const SANCTION_INTENT: [&str; 7] = [
    "co grozi",
    "co mi grozi",
    "jaka kara",
    "jaką karę",
    "jakie kary",
    "jaka sankcja",
    "wymiar kary",
];

const PENALTY_MARKERS: [&str; 7] = [
    "podlega karze",
    "kara pozbawienia wolności",
    "pozbawienia wolności",
    "ograniczenia wolności",
    "grzywn",
    "aresztu",
    "karze",
];

const DEFINITION_MARKERS: [&str; 4] = ["w rozumieniu", "oznacza", "ilekroć", "przez pojęcie"];

#[derive(Debug, Clone)]
pub struct SanctionConfig {
    /// Cap on documents kept after filtering.
    pub max_kept: usize,
}

impl Default for SanctionConfig {
    fn default() -> Self {
        Self { max_kept: 6 }
    }
}

/// Whether `query` asks about sanctions at all.
pub fn is_sanction_query(query: &str) -> bool {
    let q = query.to_lowercase();
    SANCTION_INTENT.iter().any(|m| q.contains(m))
}

/// Score and filter `docs` for a sanction question; passthrough otherwise.
pub fn filter_sanctions(
    query: &str,
    docs: Vec<ScoredChunk>,
    config: &SanctionConfig,
) -> Vec<ScoredChunk> {
    if !is_sanction_query(query) {
        return docs;
    }

    let mut scored: Vec<(i32, ScoredChunk)> = Vec::new();
    for doc in docs {
        let text = doc.chunk.content.to_lowercase();
        let mut score = 0i32;
        if PENALTY_MARKERS.iter().any(|m| text.contains(m)) {
            score += 3;
        } else if DEFINITION_MARKERS.iter().any(|m| text.contains(m)) {
            score -= 1;
        }
        if score > 0 {
            scored.push((score, doc));
        }
    }

    // Stable by score, so equal-scored documents keep retrieval order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(config.max_kept);
    debug!(kept = scored.len(), "sanction filter applied");
    scored.into_iter().map(|(_, doc)| doc).collect()
}
