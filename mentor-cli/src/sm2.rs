//! SM-2 interval scheduling for review cards.
//!
//! Card state is stored in the deck as
//! `{interval, ease_factor, review_count, status, due}`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use mentor_engine::flashcards::DeckError;
use mentor_engine::{Rating, ReviewScheduler, ScheduledCard};

/// Ease factor floor.
const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor of a fresh card.
const INITIAL_EASE_FACTOR: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    New,
    Learning,
    Review,
    Relearning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardState {
    /// Days until the next review
    pub interval: i64,
    pub ease_factor: f64,
    pub review_count: u32,
    pub status: CardStatus,
    pub due: DateTime<Utc>,
}

impl CardState {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            interval: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            review_count: 0,
            status: CardStatus::New,
            due: now,
        }
    }
}

/// Map a rating to an SM-2 quality grade (0-5).
pub fn quality(rating: Rating) -> i32 {
    match rating {
        Rating::Again => 1,
        Rating::Hard => 3,
        Rating::Good => 4,
        Rating::Easy => 5,
    }
}

/// Next state for a card answered with the given quality.
pub fn next_state(state: &CardState, quality: i32, now: DateTime<Utc>) -> CardState {
    let quality = quality.clamp(0, 5);
    let mut ease_factor = state.ease_factor;
    let interval;
    let status;

    if quality >= 3 {
        match state.review_count {
            0 => {
                interval = 1;
                status = CardStatus::Learning;
            }
            1 => {
                interval = 6;
                status = CardStatus::Review;
            }
            _ => {
                interval = ((state.interval.max(1) as f64) * ease_factor).round() as i64;
                status = CardStatus::Review;
            }
        }
        // EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
        let miss = (5 - quality) as f64;
        ease_factor = (ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE_FACTOR);
    } else {
        interval = 1;
        ease_factor = (ease_factor - 0.2).max(MIN_EASE_FACTOR);
        status = if state.status == CardStatus::Review {
            CardStatus::Relearning
        } else {
            CardStatus::Learning
        };
    }

    CardState {
        interval,
        ease_factor,
        review_count: state.review_count + 1,
        status,
        due: now + Duration::days(interval),
    }
}

/// SM-2 scheduler. Stateless apart from the per-card state in the deck.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sm2Scheduler;

impl ReviewScheduler for Sm2Scheduler {
    fn initial_state(&self, now: DateTime<Utc>) -> Value {
        serde_json::to_value(CardState::fresh(now)).unwrap_or(Value::Null)
    }

    fn review(&mut self, state: &Value, rating: Rating, now: DateTime<Utc>) -> Result<ScheduledCard, DeckError> {
        // Cards written by another scheduler start over.
        let current = serde_json::from_value::<CardState>(state.clone()).unwrap_or_else(|_| CardState::fresh(now));
        let next = next_state(&current, quality(rating), now);
        let due = next.due;
        let state = serde_json::to_value(&next).map_err(|e| DeckError::Scheduler(e.to_string()))?;
        Ok(ScheduledCard { state, due })
    }

    fn due_at(&self, state: &Value) -> Option<DateTime<Utc>> {
        state
            .get("due")
            .cloned()
            .and_then(|due| serde_json::from_value(due).ok())
    }
}
