//! Mastery arithmetic and concept sequencing.
//!
//! Pure decision logic: no I/O, no agent calls.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::profile::UserProfile;

/// How a learner's answer was judged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evaluation {
    Correct,
    PartiallyCorrect,
    Incorrect,
    Misconception,
    /// Anything else; leaves mastery unchanged
    #[serde(other)]
    NotApplicable,
}

impl From<&str> for Evaluation {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "correct" => Evaluation::Correct,
            "partially_correct" => Evaluation::PartiallyCorrect,
            "incorrect" => Evaluation::Incorrect,
            "misconception" => Evaluation::Misconception,
            _ => Evaluation::NotApplicable,
        }
    }
}

/// What to teach next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// Start teaching this concept
    StartNew(String),
    /// Nothing left to teach in this scan
    Finish,
}

/// Mastery-based planner.
#[derive(Debug, Clone)]
pub struct MasteryPlanner {
    mastery_threshold: f64,
}

impl Default for MasteryPlanner {
    fn default() -> Self {
        Self::new(0.75)
    }
}

impl MasteryPlanner {
    pub fn new(mastery_threshold: f64) -> Self {
        Self { mastery_threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.mastery_threshold
    }

    /// The mastery that follows `current` after an answer judged `evaluation`.
    pub fn next_mastery(current: f64, evaluation: &Evaluation) -> f64 {
        let next = match evaluation {
            Evaluation::Correct => current + 0.4 * (1.0 - current),
            Evaluation::PartiallyCorrect => current + 0.15 * (1.0 - current),
            Evaluation::Incorrect | Evaluation::Misconception => current * 0.85,
            Evaluation::NotApplicable => current,
        };
        next.clamp(0.0, 1.0)
    }

    /// Apply an evaluation to the learner's mastery of a concept.
    pub fn update_mastery(&self, profile: &mut UserProfile, concept_id: &str, evaluation: &Evaluation) {
        let current = profile.mastery(concept_id);
        let next = Self::next_mastery(current, evaluation);
        profile.set_mastery(concept_id, next);
        debug!(concept = concept_id, from = current, to = next, "Updated mastery");
    }

    /// Mark a concept as fully mastered.
    pub fn force_mastery(&self, profile: &mut UserProfile, concept_id: &str) {
        profile.set_mastery(concept_id, 1.0);
        debug!(concept = concept_id, "Forced mastery to 1.0");
    }

    /// Pick the next concept to teach.
    ///
    /// Scans forward from the concept after `current` (or from the start
    /// when `current` is `None` or unknown) and returns the first concept
    /// below the threshold. Earlier concepts are not revisited.
    pub fn select_next_action(
        &self,
        profile: &UserProfile,
        concept_ids: &[String],
        current: Option<&str>,
    ) -> NextAction {
        if concept_ids.is_empty() {
            return NextAction::Finish;
        }

        let start = current
            .and_then(|id| concept_ids.iter().position(|c| c == id))
            .map(|index| index + 1)
            .unwrap_or(0);

        concept_ids
            .iter()
            .skip(start)
            .find(|id| profile.mastery(id) < self.mastery_threshold)
            .map(|id| NextAction::StartNew(id.clone()))
            .unwrap_or(NextAction::Finish)
    }
}
