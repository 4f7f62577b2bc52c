//! Card extraction from the latest dialogue exchange.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use mentor_agent::{AgentPort, AgentRole};

use super::deck::ReviewManager;
use crate::profile::{Speaker, Turn};

/// Concept id for cards made while no concept is active.
pub const CONVERSATION_CONCEPT: &str = "from_conversation";

/// Turns shown to the decider and generator.
const SNIPPET_TURNS: usize = 2;

#[derive(Debug, Deserialize)]
struct CardBatch {
    #[serde(default)]
    cards: Vec<CardDraft>,
}

#[derive(Debug, Deserialize)]
struct CardDraft {
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
}

/// Decides whether the last exchange holds reviewable facts and, if so,
/// adds cards for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlashcardPipeline;

impl FlashcardPipeline {
    pub fn new() -> Self {
        Self
    }

    /// Run once for the turn just recorded. Returns how many cards were added.
    pub async fn run(
        &self,
        port: &dyn AgentPort,
        history: &[Turn],
        concept_id: Option<&str>,
        reviews: &mut ReviewManager,
    ) -> usize {
        if history.len() < SNIPPET_TURNS {
            return 0;
        }
        if history.last().map(|t| t.role) != Some(Speaker::User) {
            return 0;
        }

        let snippet = format_snippet(&history[history.len() - SNIPPET_TURNS..]);

        let verdict = port
            .complete(AgentRole::FlashcardDecider, json!(snippet))
            .await;
        let worth_it = verdict
            .text()
            .is_some_and(|text| text.to_uppercase().contains("YES"));
        if !worth_it {
            debug!("No reviewable facts in the last exchange");
            return 0;
        }

        let batch = match port
            .complete(AgentRole::FlashcardGenerator, json!(snippet))
            .await
            .decode::<CardBatch>()
        {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "Card generator reply unusable");
                return 0;
            }
        };

        let concept_id = concept_id.unwrap_or(CONVERSATION_CONCEPT);
        let mut added = 0;
        for draft in batch.cards {
            let (question, answer) = (draft.question.as_str(), draft.answer.as_str());
            if question.trim().is_empty() || answer.trim().is_empty() {
                continue;
            }
            match reviews.add_card(concept_id, question, answer) {
                Ok(Some(_)) => added += 1,
                Ok(None) => {}
                Err(e) => warn!(question, error = %e, "Could not store card"),
            }
        }

        if added > 0 {
            info!(added, concept_id, "Cards extracted from dialogue");
        }
        added
    }
}

fn format_snippet(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}
