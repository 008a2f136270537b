//! Named-entity labels and the flatten/split boundary for scalar metadata.
//!
//! The index backend only accepts scalar column values, so every multi-valued
//! metadata field (entity mentions, extracted article/paragraph numbers) is
//! stored as a comma-joined string. `flatten_mentions`/`split_mentions` are
//! the single place where that encoding lives; the enricher writes through
//! the former and the retriever/re-ranker read through the latter.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Closed set of entity labels carried on indexed chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityLabel {
    Person,
    Place,
    Org,
    Geog,
    Date,
    Time,
}

impl EntityLabel {
    pub const ALL: [EntityLabel; 6] = [
        EntityLabel::Person,
        EntityLabel::Place,
        EntityLabel::Org,
        EntityLabel::Geog,
        EntityLabel::Date,
        EntityLabel::Time,
    ];

    /// Column name under which mentions of this label are stored.
    pub fn storage_key(self) -> &'static str {
        match self {
            EntityLabel::Person => "ner_person",
            EntityLabel::Place => "ner_place",
            EntityLabel::Org => "ner_org",
            EntityLabel::Geog => "ner_geog",
            EntityLabel::Date => "ner_date",
            EntityLabel::Time => "ner_time",
        }
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.storage_key() == key)
    }
}

/// Typed mapping from entity label to the set of mention strings.
pub type EntityMap = BTreeMap<EntityLabel, BTreeSet<String>>;

/// Join a mention set into the scalar form the index stores.
pub fn flatten_mentions(mentions: &BTreeSet<String>) -> String {
    mentions.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// Split a stored scalar back into the mention set. Inverse of
/// [`flatten_mentions`]; whitespace around separators is dropped.
pub fn split_mentions(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
