use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Corpus source unavailable at {}: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
