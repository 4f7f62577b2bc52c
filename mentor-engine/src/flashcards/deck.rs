//! Per-learner deck storage
//!
//! One file per learner:
//! ```text
//! <review_dir>/<user_id>_deck.json
//! ```
//! The file is rewritten after every mutation together with the
//! scheduler's snapshot.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::models::{Flashcard, FlashcardDeck};
use super::scheduler::{Rating, ReviewScheduler, ScheduledCard};
use super::DeckError;

/// Owns one learner's deck and its file.
pub struct ReviewManager {
    path: PathBuf,
    deck: FlashcardDeck,
    scheduler: Box<dyn ReviewScheduler>,
}

impl ReviewManager {
    /// Load the learner's deck, creating it if absent.
    ///
    /// A file that does not parse is deleted and replaced by an empty deck.
    pub fn open(
        review_dir: impl AsRef<Path>,
        user_id: &str,
        mut scheduler: Box<dyn ReviewScheduler>,
    ) -> Result<Self, DeckError> {
        let review_dir = review_dir.as_ref();
        fs::create_dir_all(review_dir).map_err(|e| DeckError::io(review_dir, e))?;
        let path = review_dir.join(format!("{}_deck.json", user_id));

        let loaded = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| DeckError::io(&path, e))?;
            match serde_json::from_str::<FlashcardDeck>(&content) {
                Ok(deck) => Some(deck),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Deck file is corrupt, starting a new deck");
                    fs::remove_file(&path).map_err(|e| DeckError::io(&path, e))?;
                    None
                }
            }
        } else {
            None
        };

        let mut manager = match loaded {
            Some(deck) => {
                if let Some(snapshot) = &deck.scheduler_data {
                    scheduler.restore(snapshot);
                }
                info!(user_id, cards = deck.cards.len(), "Loaded review deck");
                Self { path, deck, scheduler }
            }
            None => Self {
                path,
                deck: FlashcardDeck::new(user_id),
                scheduler,
            },
        };
        if !manager.path.exists() {
            manager.persist()?;
        }
        Ok(manager)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn deck(&self) -> &FlashcardDeck {
        &self.deck
    }

    pub fn user_id(&self) -> &str {
        &self.deck.user_id
    }

    pub fn len(&self) -> usize {
        self.deck.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deck.cards.is_empty()
    }

    pub fn get(&self, card_id: &str) -> Option<&Flashcard> {
        self.deck.cards.get(card_id)
    }

    /// Add a card unless one with the same question exists.
    pub fn add_card(
        &mut self,
        concept_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<Option<Flashcard>, DeckError> {
        if self.deck.has_question(question) {
            debug!(question, "Skipping duplicate card");
            return Ok(None);
        }

        let card = Flashcard::new(
            concept_id,
            question,
            answer,
            self.scheduler.initial_state(Utc::now()),
        );
        self.deck.cards.insert(card.id.clone(), card.clone());
        if let Err(e) = self.persist() {
            self.deck.cards.remove(&card.id);
            return Err(e);
        }

        info!(card_id = %card.id, concept_id, "Added card");
        Ok(Some(card))
    }

    /// Remove a card. Returns whether it existed.
    pub fn delete_card(&mut self, card_id: &str) -> Result<bool, DeckError> {
        let Some(card) = self.deck.cards.remove(card_id) else {
            return Ok(false);
        };
        if let Err(e) = self.persist() {
            self.deck.cards.insert(card.id.clone(), card);
            return Err(e);
        }
        info!(card_id, "Deleted card");
        Ok(true)
    }

    /// Cards due at `now`, earliest first. Cards whose state the scheduler
    /// cannot read count as due.
    pub fn due_cards(&self, now: DateTime<Utc>) -> Vec<&Flashcard> {
        let mut due: Vec<(Option<DateTime<Utc>>, &Flashcard)> = self
            .deck
            .cards
            .values()
            .map(|card| (self.scheduler.due_at(&card.fsrs_data), card))
            .filter(|(at, _)| at.map_or(true, |at| at <= now))
            .collect();
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, card)| card).collect()
    }

    /// Record a review and persist the card's new state.
    pub fn apply_review(
        &mut self,
        card_id: &str,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<ScheduledCard, DeckError> {
        let previous = self
            .deck
            .cards
            .get(card_id)
            .map(|card| card.fsrs_data.clone())
            .ok_or_else(|| DeckError::CardNotFound(card_id.to_string()))?;
        let snapshot = self.scheduler.snapshot();

        let scheduled = self.scheduler.review(&previous, rating, now)?;
        self.set_state(card_id, scheduled.state.clone());
        if let Err(e) = self.persist() {
            self.set_state(card_id, previous);
            if let Some(snapshot) = snapshot {
                self.scheduler.restore(&snapshot);
            }
            return Err(e);
        }

        debug!(card_id, rating = rating.as_str(), due = %scheduled.due, "Card reviewed");
        Ok(scheduled)
    }

    /// Write the deck and scheduler snapshot to disk.
    ///
    /// On failure the in-memory deck is left as it was before the call.
    pub fn persist(&mut self) -> Result<(), DeckError> {
        let previous = std::mem::replace(&mut self.deck.scheduler_data, self.scheduler.snapshot());
        let written = serde_json::to_string_pretty(&self.deck)
            .map_err(|source| DeckError::Json {
                path: self.path.clone(),
                source,
            })
            .and_then(|json| fs::write(&self.path, json).map_err(|e| DeckError::io(&self.path, e)));
        if written.is_err() {
            self.deck.scheduler_data = previous;
        }
        written
    }

    fn set_state(&mut self, card_id: &str, state: serde_json::Value) {
        if let Some(card) = self.deck.cards.get_mut(card_id) {
            card.fsrs_data = state;
        }
    }
}

impl std::fmt::Debug for ReviewManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewManager")
            .field("path", &self.path)
            .field("cards", &self.deck.cards.len())
            .finish()
    }
}
