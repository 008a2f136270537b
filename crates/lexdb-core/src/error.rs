use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Source file error: {0}")]
    Source(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("No documents could be loaded from the input set")]
    NoDocuments,
}

pub type Result<T> = std::result::Result<T, Error>;
