//! Pinpoint citation extraction from free text.
//!
//! Pattern matching stands in for a structured citation parser; everything
//! regex-shaped about citations lives here so routing and retrieval stay
//! untouched if this is ever replaced with a proper tokenizer.

use once_cell::sync::Lazy;
use regex::Regex;

static ARTICLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:art\.?|artykuł)\s*(\d+[a-z]*)").expect("article pattern"));

static PARAGRAPH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:§|par\.|paragraf)\s*(\d+[a-z]*)").expect("paragraph pattern"));

/// Article/paragraph reference pulled out of a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinpointRef {
    pub article: Option<String>,
    pub paragraph: Option<String>,
}

impl PinpointRef {
    pub fn is_empty(&self) -> bool {
        self.article.is_none() && self.paragraph.is_none()
    }
}

/// Extract the first article and paragraph reference from `query`.
///
/// Only the first match of each pattern is honored; queries citing several
/// provisions ("porównaj art. 278 i art. 279") get routed by the first one.
pub fn extract_refs(query: &str) -> PinpointRef {
    let article = ARTICLE_RE
        .captures(query)
        .map(|c| c[1].to_lowercase());
    let paragraph = PARAGRAPH_RE
        .captures(query)
        .map(|c| c[1].to_lowercase());
    PinpointRef { article, paragraph }
}

/// All article numbers mentioned in `text`, in order of appearance,
/// deduplicated. Used by the ingest-time enricher and by the entity-aware
/// re-ranker on the query side.
pub fn find_articles(text: &str) -> Vec<String> {
    collect_unique(&ARTICLE_RE, text)
}

/// All paragraph numbers mentioned in `text`; see [`find_articles`].
pub fn find_paragraphs(text: &str) -> Vec<String> {
    collect_unique(&PARAGRAPH_RE, text)
}

fn collect_unique(re: &Regex, text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for cap in re.captures_iter(text) {
        let num = cap[1].to_lowercase();
        if seen.insert(num.clone()) {
            out.push(num);
        }
    }
    out
}
