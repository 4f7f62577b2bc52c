//! Crate-wide error type.

use crate::config::ConfigError;
use crate::flashcards::DeckError;
use crate::knowledge::StoreError;
use crate::synthesis::SynthesisError;

/// Error types for the tutoring engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Knowledge store error
    #[error("Knowledge store error: {0}")]
    Store(#[from] StoreError),

    /// Synthesis error
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Review deck error
    #[error("Review deck error: {0}")]
    Deck(#[from] DeckError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Agent reply could not be used
    #[error("Agent reply error: {0}")]
    Decode(#[from] mentor_agent::DecodeError),

    /// A concept failed validation
    #[error("Invalid concept: {0}")]
    InvalidConcept(String),

    /// An operation needs a loaded topic
    #[error("No topic is loaded")]
    NoActiveTopic,
}

pub type Result<T> = std::result::Result<T, EngineError>;
