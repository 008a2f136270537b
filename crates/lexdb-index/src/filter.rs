//! Rendering of the metadata filter tree into a LanceDB SQL predicate.

use lexdb_core::types::MetadataFilter;

/// Render `filter` as a SQL predicate for `only_if` pushdown. String values
/// are single-quote escaped; composite nodes are parenthesized so nesting
/// never changes precedence.
pub fn to_sql_predicate(filter: &MetadataFilter) -> String {
    match filter {
        MetadataFilter::Eq(key, value) => {
            format!("{} = '{}'", key, value.replace('\'', "''"))
        }
        MetadataFilter::And(parts) => join_parts(parts, " AND "),
        MetadataFilter::Or(parts) => join_parts(parts, " OR "),
    }
}

fn join_parts(parts: &[MetadataFilter], sep: &str) -> String {
    let rendered: Vec<String> =
        parts.iter().map(|p| format!("({})", to_sql_predicate(p))).collect();
    rendered.join(sep)
}
