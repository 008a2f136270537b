#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod classifier;
pub mod refs;

pub use classifier::{ActClassifier, RoutingConfig};
pub use refs::{extract_refs, find_articles, find_paragraphs, PinpointRef};
