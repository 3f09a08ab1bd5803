//! Error types for the parc pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParcError {
    #[error("Data store error: {0}")]
    Store(String),

    #[error("Embedding service error: {0}")]
    Embedding(String),

    #[error("Language model error: {0}")]
    LanguageModel(String),

    #[error("Handler error: {0}")]
    Handler(String),

    #[error("Pattern table error: {0}")]
    PatternTable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParcError {
    pub fn code(&self) -> i32 {
        match self {
            ParcError::Store(_) => -32001,
            ParcError::Embedding(_) => -32002,
            ParcError::LanguageModel(_) => -32003,
            ParcError::Handler(_) => -32004,
            ParcError::PatternTable(_) => -32005,
            ParcError::Io(_) => -32006,
            ParcError::Json(_) => -32700,
            ParcError::Internal(_) => -32603,
        }
    }
}

/// Errors surfaced by the data store boundary.
///
/// Handlers convert these into a graceful "nothing found" path; they never
/// reach the caller of `process()`.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Errors raised inside a handler.
///
/// The dispatcher treats any of these as "no match" and falls through to the
/// generic query engine.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("missing entity: {0}")]
    MissingEntity(&'static str),

    #[error("handler failed: {0}")]
    Failed(String),
}
