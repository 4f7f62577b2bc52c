//! Data models for review cards

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// A question/answer pair with opaque scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Flashcard {
    pub id: String,
    pub concept_id: String,
    pub question: String,
    pub answer: String,
    /// Owned by the scheduler; the deck never looks inside
    #[serde(default)]
    #[cfg_attr(feature = "typescript", ts(type = "unknown"))]
    pub fsrs_data: Value,
}

impl Flashcard {
    pub fn new(
        concept_id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        fsrs_data: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            concept_id: concept_id.into(),
            question: question.into(),
            answer: answer.into(),
            fsrs_data,
        }
    }
}

/// Every card one learner owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct FlashcardDeck {
    pub user_id: String,
    #[serde(default)]
    pub cards: BTreeMap<String, Flashcard>,
    #[serde(default)]
    #[cfg_attr(feature = "typescript", ts(type = "unknown"))]
    pub scheduler_data: Option<Value>,
}

impl FlashcardDeck {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Whether a card with exactly this question exists.
    pub fn has_question(&self, question: &str) -> bool {
        self.cards.values().any(|card| card.question == question)
    }
}
