//! Mentor Engine - turn-driven tutoring orchestration
//!
//! Takes a learner from "I want to learn X" to a sequence of tutored
//! concepts:
//!
//! - **Goal elicitation**: by conversation or from uploaded material
//! - **Knowledge synthesis**: generated concepts, validated and retried
//! - **Mastery planning**: per-concept scores and forward-only sequencing
//! - **Strategy dispatch**: a closed set of teaching moves and their effects
//! - **Review cards**: extracted from dialogue into a per-learner deck
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Orchestrator                          │
//! │                                                             │
//! │  Idle/AnalyzingGoal ─► AwaitingPlanConfirmation            │
//! │          │                        │                         │
//! │          └──────► GeneratingKb ◄──┘                         │
//! │                        │                                    │
//! │                        ▼                                    │
//! │                    Tutoring ──► FlashcardPipeline           │
//! └───────┬──────────────┬──────────────┬───────────────────────┘
//!         ▼              ▼              ▼
//!  BlueprintElicitor  KnowledgeStore  StrategyDispatcher
//!                    (+ Synthesizer)  (+ MasteryPlanner)
//! ```

pub mod config;
pub mod flashcards;
pub mod goal;
pub mod knowledge;
pub mod orchestrator;
pub mod planner;
pub mod profile;
pub mod retry;
pub mod strategy;
pub mod synthesis;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types
pub use config::EngineConfig;
pub use flashcards::{Flashcard, FlashcardDeck, Rating, ReviewManager, ReviewScheduler, ScheduledCard};
pub use goal::{BlueprintStatus, LearningBlueprint};
pub use knowledge::{Concept, ConceptCollection, KnowledgeStore};
pub use orchestrator::{Orchestrator, TutorState, APOLOGY};
pub use planner::{Evaluation, MasteryPlanner, NextAction};
pub use profile::{Speaker, Turn, UserProfile};
pub use retry::RetryPolicy;
pub use strategy::{PedagogicalDecision, ResponseStrategy};
pub use types::{EngineError, Result};
