//! JSON source loading and character chunking.
//!
//! Each source file is one JSON array produced by the statute parsers. An
//! element's text lives under `text_content`, `text` or `content` (first
//! present wins); its `metadata` object is reduced to the scalar fields the
//! index schema knows about.

use anyhow::Result;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

use lexdb_core::types::ChunkMetadata;

/// Entries shorter than this are parser noise, not statute text.
const MIN_CONTENT_CHARS: usize = 5;

/// One loadable entry from a source file, before chunking.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// Derive an act name from the file name when the JSON carries none:
/// `kodeks_postępowania_karnego.json` -> `Kodeks postępowania karnego`.
/// Deliberately not title-cased; partition keys are case-sensitive.
pub fn fallback_act_name(filename: &str) -> String {
    let base = filename.trim_end_matches(".json").replace('_', " ");
    let base = base.trim();
    if base.is_empty() {
        return "Nieznany akt prawny".to_string();
    }
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => base.to_string(),
    }
}

/// Load all usable records from one source file. A file that is unreadable,
/// not valid JSON, or not a JSON array is an error; the caller decides
/// whether to skip it and continue.
pub fn load_source_file(path: &Path) -> Result<Vec<SourceRecord>> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let raw = fs::read_to_string(path)?;
    let parsed: Value = serde_json::from_str(&raw)?;
    let items = parsed
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("{filename}: JSON root is not an array"))?;

    let fallback = fallback_act_name(&filename);
    let mut records = Vec::new();
    for item in items {
        let Some(obj) = item.as_object() else { continue };
        let content = ["text_content", "text", "content"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str));
        let Some(content) = content else { continue };
        if content.trim().chars().count() < MIN_CONTENT_CHARS {
            continue;
        }

        let meta = obj.get("metadata").and_then(Value::as_object);
        let act_name = meta
            .and_then(|m| m.get("act_name"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| fallback.clone());
        let metadata = ChunkMetadata {
            source: filename.clone(),
            page: meta.and_then(|m| m.get("page")).and_then(Value::as_i64).unwrap_or(1),
            article: scalar_string(meta, "article"),
            paragraph: scalar_string(meta, "paragraph"),
            act_name: act_name.clone(),
            ..ChunkMetadata::default()
        };
        // The act header keeps the partition visible to the generator even
        // when a chunk carries no citation of its own.
        let content = format!("USTAWA: {}\nTREŚĆ PRZEPISU:\n{}", act_name, content);
        records.push(SourceRecord { content, metadata });
    }
    debug!(file = %filename, records = records.len(), "loaded source file");
    Ok(records)
}

fn scalar_string(meta: Option<&serde_json::Map<String, Value>>, key: &str) -> Option<String> {
    let value = meta?.get(key)?;
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, overlap: 200 }
    }
}

/// Split `text` into windows of at most `chunk_size` characters, preferring
/// paragraph boundaries and overlapping long-paragraph splits by `overlap`.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        let chars: Vec<char> = paragraph.chars().collect();
        if chars.len() <= config.chunk_size {
            chunks.push(paragraph.to_string());
            continue;
        }
        let step = config.chunk_size.saturating_sub(config.overlap).max(1);
        let mut start = 0;
        while start < chars.len() {
            let end = (start + config.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end >= chars.len() {
                break;
            }
            start += step;
        }
    }
    chunks
}
