//! Arrow schema for the statute table.
//!
//! Every metadata field is a scalar column; multi-valued fields arrive
//! already flattened to comma-joined strings (see `lexdb-core::metadata`).

use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

use lexdb_core::metadata::EntityLabel;

pub const EMBEDDING_DIM: i32 = 1024;

pub fn build_arrow_schema() -> Arc<Schema> {
    let mut fields = vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("act_name", DataType::Utf8, false),
        Field::new("page", DataType::Int64, false),
        Field::new("article", DataType::Utf8, true),
        Field::new("paragraph", DataType::Utf8, true),
        Field::new("articles", DataType::Utf8, true),
        Field::new("paragraphs", DataType::Utf8, true),
    ];
    for label in EntityLabel::ALL {
        fields.push(Field::new(label.storage_key(), DataType::Utf8, true));
    }
    fields.push(Field::new("content", DataType::Utf8, false));
    fields.push(Field::new(
        "vector",
        DataType::FixedSizeList(
            Arc::new(Field::new("item", DataType::Float32, true)),
            EMBEDDING_DIM,
        ),
        true,
    ));
    Arc::new(Schema::new(fields))
}
