//! Maps a free-text question to the act partitions worth searching.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use lexdb_core::catalog::ActCatalog;

/// Vocabulary that marks a theft/appropriation question; together with a
/// currency amount it triggers the threshold routing shortcut.
const THEFT_HINTS: [&str; 6] =
    ["kradzież", "kradnie", "przywłaszc", "zabiera", "włamaniem", "paserstwo"];

/// Comparison/contrast vocabulary; its presence widens routing to several acts.
const CROSS_ACT_HINTS: [&str; 7] =
    ["porównaj", "różnica", "różnią się", "zestaw", "na tle", "zarówno", "a także"];

static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d[\d\s]{0,10})\s*zł").expect("amount pattern"));

#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Monetary boundary between the contravention and the felony regime.
    /// Amounts at or above it route felony-first.
    pub theft_threshold: u64,
    pub felony_act: String,
    pub minor_offense_act: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            theft_threshold: 800,
            felony_act: "Kodeks Karny".to_string(),
            minor_offense_act: "Kodeks wykroczeń".to_string(),
        }
    }
}

/// Scores catalog aliases against the query text and returns act names in
/// priority order. Pure function of (text, catalog, config): no internal
/// state, identical output on repeated calls.
pub struct ActClassifier {
    catalog: Arc<ActCatalog>,
    config: RoutingConfig,
}

impl ActClassifier {
    pub fn new(catalog: Arc<ActCatalog>, config: RoutingConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &ActCatalog {
        &self.catalog
    }

    /// Classify `query` into at most `max_acts` act names, best first.
    /// An empty result means "no textual evidence, search all partitions".
    pub fn classify(&self, query: &str, max_acts: usize) -> Vec<String> {
        let q = query.to_lowercase();

        // Theft questions with an explicit amount route deterministically
        // around the statutory value threshold.
        if let Some(amount) = extract_amount(&q) {
            if THEFT_HINTS.iter().any(|h| q.contains(h)) {
                let ordered = if amount < self.config.theft_threshold {
                    [&self.config.minor_offense_act, &self.config.felony_act]
                } else {
                    [&self.config.felony_act, &self.config.minor_offense_act]
                };
                let routed: Vec<String> =
                    ordered.iter().map(|s| s.to_string()).take(max_acts.max(1)).collect();
                debug!(amount, ?routed, "amount-threshold routing");
                return routed;
            }
        }

        let mut scored: Vec<(i64, &str)> = Vec::new();
        for act in self.catalog.iter() {
            let mut score: i64 = 0;
            for alias in &act.aliases {
                if q.contains(alias.as_str()) {
                    score += 10 + (alias.chars().count() as i64 / 7).min(6);
                }
            }
            if score > 0 {
                score += i64::from(act.priority);
                scored.push((score, act.name.as_str()));
            }
        }

        if scored.is_empty() {
            debug!("no alias evidence, falling back to all partitions");
            return Vec::new();
        }

        // Stable sort: catalog declaration order breaks score ties.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let take = if is_cross_act(&q) { max_acts } else { 1 };
        let routed: Vec<String> =
            scored.into_iter().take(take).map(|(_, name)| name.to_string()).collect();
        debug!(?routed, "alias routing");
        routed
    }
}

fn is_cross_act(lowercased: &str) -> bool {
    CROSS_ACT_HINTS.iter().any(|h| lowercased.contains(h))
}

/// Parse a currency-like amount ("1 500 zł", "500zł") out of the query.
fn extract_amount(lowercased: &str) -> Option<u64> {
    let normalized = lowercased.replace('\u{a0}', " ");
    let caps = AMOUNT_RE.captures(&normalized)?;
    let raw: String = caps[1].chars().filter(|c| !c.is_whitespace()).collect();
    raw.parse().ok()
}
