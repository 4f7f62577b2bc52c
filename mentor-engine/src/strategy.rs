//! Pedagogical strategy: what the strategist decided and what it does to
//! the learner's state.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use mentor_agent::{AgentPort, AgentRole, DecodeError};

use crate::config::StrategyConfig;
use crate::knowledge::Concept;
use crate::planner::{MasteryPlanner, NextAction};
use crate::profile::{Turn, UserProfile};

/// The closed set of teaching moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStrategy {
    AnswerQuestion,
    ProgressToNextConcept,
    ReviewAndClarify,
    SocraticGuidance,
    ConsolidateAndVerify,
    HandleIrrelevance,
    FollowUserLead,
    AcknowledgeAndWait,
}

impl ResponseStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStrategy::AnswerQuestion => "answer_question",
            ResponseStrategy::ProgressToNextConcept => "progress_to_next_concept",
            ResponseStrategy::ReviewAndClarify => "review_and_clarify",
            ResponseStrategy::SocraticGuidance => "socratic_guidance",
            ResponseStrategy::ConsolidateAndVerify => "consolidate_and_verify",
            ResponseStrategy::HandleIrrelevance => "handle_irrelevance",
            ResponseStrategy::FollowUserLead => "follow_user_lead",
            ResponseStrategy::AcknowledgeAndWait => "acknowledge_and_wait",
        }
    }
}

impl std::fmt::Display for ResponseStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the tutor says this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorAction {
    #[serde(default, alias = "actionType")]
    pub action_type: String,
    pub content: String,
}

/// The strategist's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedagogicalDecision {
    /// The strategist's private reasoning
    #[serde(default)]
    pub analysis: String,
    #[serde(alias = "responseStrategy")]
    pub response_strategy: ResponseStrategy,
    pub action: TutorAction,
}

/// Where tutoring goes after a decision is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Keep teaching the current concept
    Stay,
    /// Move on to this concept
    Advance(String),
    /// Nothing left to teach
    Complete,
}

/// Asks the strategist for a decision and applies its side effects.
#[derive(Debug, Clone)]
pub struct StrategyDispatcher {
    config: StrategyConfig,
}

impl StrategyDispatcher {
    pub fn new(config: StrategyConfig) -> Self {
        Self { config }
    }

    /// Context sent to the strategist.
    pub fn context(
        user_message: &str,
        concept_id: &str,
        concept: &Concept,
        mastery: f64,
        history: &[Turn],
    ) -> Value {
        json!({
            "user_message": user_message,
            "current_concept": {
                "name": concept_id,
                "difficulty": concept.difficulty,
                "definition": concept.definition,
            },
            "user_mastery_level": mastery,
            "conversation_history": history,
        })
    }

    /// Ask the strategist what to do.
    pub async fn decide(&self, port: &dyn AgentPort, context: Value) -> Result<PedagogicalDecision, DecodeError> {
        let decision = port
            .complete(AgentRole::PedagogicalStrategist, context)
            .await
            .decode::<PedagogicalDecision>()?;
        debug!(
            strategy = %decision.response_strategy,
            action = %decision.action.action_type,
            "Strategist decided"
        );
        Ok(decision)
    }

    /// Apply a strategy's effect on mastery and sequencing.
    pub fn apply(
        &self,
        strategy: ResponseStrategy,
        profile: &mut UserProfile,
        planner: &MasteryPlanner,
        concept_ids: &[String],
        current: &str,
    ) -> Dispatch {
        match strategy {
            ResponseStrategy::ProgressToNextConcept => {
                planner.force_mastery(profile, current);
                match planner.select_next_action(profile, concept_ids, Some(current)) {
                    NextAction::StartNew(next) => Dispatch::Advance(next),
                    NextAction::Finish => Dispatch::Complete,
                }
            }
            ResponseStrategy::ReviewAndClarify => {
                let mastery = profile.mastery_or(current, self.config.review_prior);
                profile.set_mastery(current, (mastery - self.config.review_penalty).max(0.0));
                Dispatch::Stay
            }
            ResponseStrategy::ConsolidateAndVerify | ResponseStrategy::SocraticGuidance => {
                let mastery = profile.mastery_or(current, self.config.consolidate_prior);
                profile.set_mastery(current, (mastery + self.config.consolidate_bonus).min(1.0));
                Dispatch::Stay
            }
            ResponseStrategy::AnswerQuestion
            | ResponseStrategy::HandleIrrelevance
            | ResponseStrategy::FollowUserLead
            | ResponseStrategy::AcknowledgeAndWait => Dispatch::Stay,
        }
    }
}

impl Default for StrategyDispatcher {
    fn default() -> Self {
        Self::new(StrategyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedAgent;
    use mentor_agent::AgentReply;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_decision_accepts_both_casings() {
        let camel: PedagogicalDecision = serde_json::from_value(json!({
            "analysis": "correct answer",
            "responseStrategy": "consolidate_and_verify",
            "action": {"actionType": "ask_question", "content": "Why?"}
        }))
        .unwrap();
        let snake: PedagogicalDecision = serde_json::from_value(json!({
            "analysis": "correct answer",
            "response_strategy": "consolidate_and_verify",
            "action": {"action_type": "ask_question", "content": "Why?"}
        }))
        .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.response_strategy, ResponseStrategy::ConsolidateAndVerify);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let result = serde_json::from_value::<PedagogicalDecision>(json!({
            "responseStrategy": "improvise",
            "action": {"content": "?"}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_review_uses_its_prior() {
        let dispatcher = StrategyDispatcher::default();
        let planner = MasteryPlanner::default();
        let mut profile = UserProfile::new("u");

        let outcome = dispatcher.apply(ResponseStrategy::ReviewAndClarify, &mut profile, &planner, &ids(&["A"]), "A");
        assert_eq!(outcome, Dispatch::Stay);
        assert_eq!(profile.mastery("A"), 0.0);

        profile.set_mastery("A", 0.5);
        dispatcher.apply(ResponseStrategy::ReviewAndClarify, &mut profile, &planner, &ids(&["A"]), "A");
        assert!((profile.mastery("A") - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_consolidate_caps_at_one() {
        let dispatcher = StrategyDispatcher::default();
        let planner = MasteryPlanner::default();
        let mut profile = UserProfile::new("u");

        dispatcher.apply(ResponseStrategy::SocraticGuidance, &mut profile, &planner, &ids(&["A"]), "A");
        assert!((profile.mastery("A") - 0.2).abs() < 1e-9);

        profile.set_mastery("A", 0.95);
        dispatcher.apply(ResponseStrategy::ConsolidateAndVerify, &mut profile, &planner, &ids(&["A"]), "A");
        assert_eq!(profile.mastery("A"), 1.0);
    }

    #[test]
    fn test_progress_advances_or_completes() {
        let dispatcher = StrategyDispatcher::default();
        let planner = MasteryPlanner::default();
        let mut profile = UserProfile::new("u");
        let concepts = ids(&["A", "B"]);

        let outcome = dispatcher.apply(ResponseStrategy::ProgressToNextConcept, &mut profile, &planner, &concepts, "A");
        assert_eq!(outcome, Dispatch::Advance("B".into()));
        assert_eq!(profile.mastery("A"), 1.0);

        let outcome = dispatcher.apply(ResponseStrategy::ProgressToNextConcept, &mut profile, &planner, &concepts, "B");
        assert_eq!(outcome, Dispatch::Complete);
    }

    #[test]
    fn test_neutral_strategies_leave_mastery() {
        let dispatcher = StrategyDispatcher::default();
        let planner = MasteryPlanner::default();
        let mut profile = UserProfile::new("u");

        for strategy in [
            ResponseStrategy::AnswerQuestion,
            ResponseStrategy::HandleIrrelevance,
            ResponseStrategy::FollowUserLead,
            ResponseStrategy::AcknowledgeAndWait,
        ] {
            assert_eq!(dispatcher.apply(strategy, &mut profile, &planner, &ids(&["A"]), "A"), Dispatch::Stay);
        }
        assert!(profile.knowledge_mastery.is_empty());
    }

    #[tokio::test]
    async fn test_decide_reads_text_reply() {
        let agent = ScriptedAgent::new().reply(
            AgentRole::PedagogicalStrategist,
            AgentReply::RawText(
                "```json\n{\"analysis\": \"a\", \"responseStrategy\": \"answer_question\", \
                 \"action\": {\"actionType\": \"explain\", \"content\": \"Because.\"}}\n```"
                    .into(),
            ),
        );
        let concept = Concept {
            definition: "d".into(),
            example: "e".into(),
            socratic_prompts: vec!["p1".into(), "p2".into()],
            difficulty: 2,
        };
        let history = vec![Turn::user("why?")];
        let context = StrategyDispatcher::context("why?", "A", &concept, 0.4, &history);
        assert_eq!(context["current_concept"]["difficulty"], 2);
        assert_eq!(context["conversation_history"][0]["role"], "user");

        let decision = StrategyDispatcher::default().decide(&agent, context).await.unwrap();
        assert_eq!(decision.response_strategy, ResponseStrategy::AnswerQuestion);
        assert_eq!(decision.action.content, "Because.");
    }
}
