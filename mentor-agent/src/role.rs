//! The closed vocabulary of agent roles.
//!
//! Every external call names exactly one role. The role fixes the system
//! prompt, the reply format the caller expects, and the sampling
//! temperature; the caller only supplies a JSON context.

use serde::{Deserialize, Serialize};

/// What shape of reply a role is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyFormat {
    /// A single JSON object
    Json,
    /// Free text
    Text,
}

/// Agent roles available to the tutoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentRole {
    /// Builds the learning blueprint through conversation
    GoalElicitor,
    /// Builds a blueprint from uploaded material in one shot
    ContentAnalyzer,
    /// Classifies a reply to a proposed plan as confirm/reject/unclear
    IntentClassifier,
    /// Designs the concept collection for a confirmed blueprint
    InstructionalDesigner,
    /// Picks the teaching strategy for a tutoring turn
    PedagogicalStrategist,
    /// Decides whether a dialogue snippet holds reviewable facts
    FlashcardDecider,
    /// Writes question/answer cards from a dialogue snippet
    FlashcardGenerator,
    /// Writes a single concept on demand
    GuidanceResponder,
}

impl AgentRole {
    /// Get all roles.
    pub fn all() -> &'static [AgentRole] {
        &[
            AgentRole::GoalElicitor,
            AgentRole::ContentAnalyzer,
            AgentRole::IntentClassifier,
            AgentRole::InstructionalDesigner,
            AgentRole::PedagogicalStrategist,
            AgentRole::FlashcardDecider,
            AgentRole::FlashcardGenerator,
            AgentRole::GuidanceResponder,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::GoalElicitor => "goal-elicitor",
            AgentRole::ContentAnalyzer => "content-analyzer",
            AgentRole::IntentClassifier => "intent-classifier",
            AgentRole::InstructionalDesigner => "instructional-designer",
            AgentRole::PedagogicalStrategist => "pedagogical-strategist",
            AgentRole::FlashcardDecider => "flashcard-decider",
            AgentRole::FlashcardGenerator => "flashcard-generator",
            AgentRole::GuidanceResponder => "guidance-responder",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            AgentRole::GoalElicitor => "Elicit a learning goal through conversation",
            AgentRole::ContentAnalyzer => "Derive a learning plan from uploaded material",
            AgentRole::IntentClassifier => "Classify a reply to a proposed learning plan",
            AgentRole::InstructionalDesigner => "Design the concepts that cover a learning plan",
            AgentRole::PedagogicalStrategist => "Choose how to respond during tutoring",
            AgentRole::FlashcardDecider => "Decide whether a snippet contains reviewable facts",
            AgentRole::FlashcardGenerator => "Write review cards from a dialogue snippet",
            AgentRole::GuidanceResponder => "Write a single concept on request",
        }
    }

    /// The reply format this role must produce.
    pub fn reply_format(&self) -> ReplyFormat {
        match self {
            AgentRole::FlashcardDecider => ReplyFormat::Text,
            _ => ReplyFormat::Json,
        }
    }

    /// Sampling temperature override. Classification roles run greedy.
    pub fn temperature(&self) -> Option<f32> {
        match self {
            AgentRole::IntentClassifier | AgentRole::FlashcardDecider => Some(0.0),
            _ => None,
        }
    }

    /// System prompt sent ahead of the JSON context.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            AgentRole::GoalElicitor => {
                "You help a learner pin down what they want to learn. The context holds the \
                 current blueprint and the conversation so far. Update the blueprint with \
                 anything the learner just told you and return it as JSON with the keys \
                 status (incomplete | pending_confirmation | complete), topic (string or null), \
                 sub_topics (list of strings), current_level (unknown | beginner | intermediate \
                 | advanced), learning_style (unknown | socratic | example_driven | direct) and \
                 next_question (the single question to ask next, in the learner's language). \
                 Only mark the status complete once topic, sub_topics, level and style are known \
                 and the learner agreed."
            }
            AgentRole::ContentAnalyzer => {
                "You read study material supplied by a learner and propose a learning plan. \
                 Return JSON {\"learning_blueprint\": {\"topic\": a short name, \"sub_topics\": \
                 the ordered list of sections worth teaching, \"current_level\", \
                 \"learning_style\"}, \"user_facing_summary\": a short summary of the plan in the \
                 learner's language, ending with a question asking them to confirm it}."
            }
            AgentRole::IntentClassifier => {
                "A learner was shown a proposed learning plan. Classify their reply. Return JSON \
                 {\"intent\": \"confirm\" | \"reject\" | \"unclear\"}."
            }
            AgentRole::InstructionalDesigner => {
                "You design a knowledge base for a confirmed learning blueprint, optionally \
                 grounded in source material. Return JSON {\"concepts\": {<name>: {\"definition\": \
                 str, \"example\": str, \"socratic_prompts\": [str, str, ...], \"difficulty\": \
                 1-5}}}. Use every sub-topic of the blueprint verbatim as a concept name, order \
                 concepts from foundational to advanced, and give each at least two guiding \
                 questions."
            }
            AgentRole::PedagogicalStrategist => {
                "You are a Socratic tutor. The context holds the learner's latest message, the \
                 concept being taught, the learner's mastery score for it and the recent \
                 conversation. Decide how to respond and return JSON {\"analysis\": str, \
                 \"responseStrategy\": one of answer_question, progress_to_next_concept, \
                 review_and_clarify, socratic_guidance, consolidate_and_verify, \
                 handle_irrelevance, follow_user_lead, acknowledge_and_wait, \"action\": \
                 {\"actionType\": str, \"content\": str}}. The content is what the learner sees."
            }
            AgentRole::FlashcardDecider => {
                "Look at the dialogue snippet. Does it state at least one atomic, reusable fact \
                 (a definition, formula, date or rule) worth reviewing later? Answer with YES or \
                 NO only."
            }
            AgentRole::FlashcardGenerator => {
                "Turn the atomic facts in the dialogue snippet into review cards. Return JSON \
                 {\"cards\": [{\"question\": str, \"answer\": str}, ...]}. Each question must be \
                 answerable on its own."
            }
            AgentRole::GuidanceResponder => {
                "Write one teachable concept for the requested name within the given topic. \
                 Return JSON {\"definition\": str, \"example\": str, \"socratic_prompts\": [str, \
                 str, ...], \"difficulty\": 1-5} with at least two guiding questions."
            }
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
