//! Review cards extracted from tutoring dialogue
//!
//! This module provides:
//! - The per-learner deck and its JSON file
//! - The scheduler port the deck delegates review timing to
//! - The extraction pipeline run after each tutoring turn

pub mod deck;
pub mod models;
pub mod pipeline;
pub mod scheduler;

pub use deck::ReviewManager;
pub use models::{Flashcard, FlashcardDeck};
pub use pipeline::{FlashcardPipeline, CONVERSATION_CONCEPT};
pub use scheduler::{Rating, ReviewScheduler, ScheduledCard};

use std::path::PathBuf;

/// Deck storage errors.
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("card not found: {0}")]
    CardNotFound(String),

    #[error("unknown rating: {0}")]
    UnknownRating(String),

    #[error("scheduler error: {0}")]
    Scheduler(String),
}

impl DeckError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeckError::Io {
            path: path.into(),
            source,
        }
    }
}
