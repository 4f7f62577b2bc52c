//! Knowledge store: named concept collections on disk.

pub mod fuzzy;
pub mod models;
pub mod store;

pub use models::{Concept, ConceptCollection};
pub use store::{InvalidReason, KnowledgeStore, SavedCollection};

use std::path::PathBuf;

/// Error types for the knowledge store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is not valid JSON
    #[error("cannot parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// File root is not a JSON object
    #[error("{0} does not hold a JSON object")]
    NotAnObject(PathBuf),

    /// No stored topic is close enough to the requested name
    #[error("no knowledge base similar to '{0}'")]
    TopicNotFound(String),

    /// The topic name has no usable characters for a filename
    #[error("topic '{0}' cannot be used as a file name")]
    InvalidTopic(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
