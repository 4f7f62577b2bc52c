//! Learner profile: mastery, misconceptions and dialogue history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Who said a line of dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
        }
    }

    /// Capitalized label used when linearizing history for a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Assistant => "Assistant",
        }
    }
}

/// One line of dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Turn {
    pub role: Speaker,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::Assistant,
            content: content.into(),
        }
    }
}

/// Everything the engine tracks about one learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    /// concept id -> mastery in [0, 1]
    pub knowledge_mastery: HashMap<String, f64>,
    /// concept id -> when it was last touched in tutoring
    pub last_review_time: HashMap<String, DateTime<Utc>>,
    /// concept id -> misconceptions noticed while teaching it
    pub misconceptions_log: HashMap<String, Vec<String>>,
    pub dialogue_history: Vec<Turn>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            knowledge_mastery: HashMap::new(),
            last_review_time: HashMap::new(),
            misconceptions_log: HashMap::new(),
            dialogue_history: Vec::new(),
        }
    }

    /// Recorded mastery, or `prior` when there is none.
    pub fn mastery_or(&self, concept_id: &str, prior: f64) -> f64 {
        self.knowledge_mastery
            .get(concept_id)
            .copied()
            .unwrap_or(prior)
    }

    /// Recorded mastery, zero when there is none.
    pub fn mastery(&self, concept_id: &str) -> f64 {
        self.mastery_or(concept_id, 0.0)
    }

    /// Store a mastery value, clamped to [0, 1].
    pub fn set_mastery(&mut self, concept_id: &str, value: f64) {
        self.knowledge_mastery
            .insert(concept_id.to_string(), value.clamp(0.0, 1.0));
        self.last_review_time
            .insert(concept_id.to_string(), Utc::now());
    }

    pub fn log_misconception(&mut self, concept_id: &str, note: impl Into<String>) {
        self.misconceptions_log
            .entry(concept_id.to_string())
            .or_default()
            .push(note.into());
    }

    pub fn push_turn(&mut self, turn: Turn) {
        self.dialogue_history.push(turn);
    }

    /// The last `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> &[Turn] {
        let start = self.dialogue_history.len().saturating_sub(n);
        &self.dialogue_history[start..]
    }

    /// Wipe all learning state for a fresh session.
    pub fn reset(&mut self) {
        tracing::info!(user_id = %self.user_id, "Resetting learner profile");
        self.knowledge_mastery.clear();
        self.last_review_time.clear();
        self.misconceptions_log.clear();
        self.dialogue_history.clear();
    }
}
