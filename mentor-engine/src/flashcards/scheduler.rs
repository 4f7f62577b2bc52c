//! The review-scheduling port.
//!
//! The deck stores each card's scheduling state as an opaque JSON value and
//! leaves its meaning to a [`ReviewScheduler`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::DeckError;

/// How well a card was recalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }
}

impl FromStr for Rating {
    type Err = DeckError;

    /// Accepts the names and the 1-4 button numbers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "again" | "1" => Ok(Rating::Again),
            "hard" | "2" => Ok(Rating::Hard),
            "good" | "3" => Ok(Rating::Good),
            "easy" | "4" => Ok(Rating::Easy),
            other => Err(DeckError::UnknownRating(other.to_string())),
        }
    }
}

/// A card's state after a review.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledCard {
    pub state: Value,
    pub due: DateTime<Utc>,
}

/// Maps a card's state and a rating to its next state and due time.
pub trait ReviewScheduler: Send + Sync {
    /// State for a card that was never reviewed.
    fn initial_state(&self, now: DateTime<Utc>) -> Value;

    /// Apply one review.
    fn review(&mut self, state: &Value, rating: Rating, now: DateTime<Utc>) -> Result<ScheduledCard, DeckError>;

    /// When a card with this state is next due; `None` if unreadable.
    fn due_at(&self, state: &Value) -> Option<DateTime<Utc>>;

    /// Scheduler-wide data stored alongside the deck.
    fn snapshot(&self) -> Option<Value> {
        None
    }

    /// Restore from a stored snapshot.
    fn restore(&mut self, _snapshot: &Value) {}
}
