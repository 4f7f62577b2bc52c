//! Goal elicitation: conversational, from material, and plan confirmation.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use mentor_agent::{AgentPort, AgentReply, AgentRole, DecodeError};

use super::blueprint::{BlueprintStatus, BlueprintUpdate, LearningBlueprint};
use crate::profile::Turn;
use crate::retry::{Attempt, RetryPolicy};

/// Turns of history shown to the goal elicitor.
const ELICITATION_HISTORY: usize = 10;

const REJECT_WORDS: &[&str] = &["no", "nope", "change", "adjust", "different"];
const REJECT_PHRASES: &[&str] = &["不了", "不要", "改", "调整"];
const CONFIRM_WORDS: &[&str] = &["yes", "yeah", "ok", "okay", "sure", "great", "good", "start", "confirm"];
const CONFIRM_PHRASES: &[&str] = &["好", "可以", "没问题", "确认", "开始", "学习"];

/// Result of one conversational elicitation turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Elicitation {
    /// The blueprint is complete and confirmed
    Complete,
    /// Keep going; ask this next
    Ask(String),
    /// The reply was not a blueprint; show it to the learner as-is
    Unparsed(String),
    /// The agent failed
    Failed(String),
}

/// Content analysis reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentAnalysis {
    pub learning_blueprint: BlueprintUpdate,
    #[serde(default)]
    pub user_facing_summary: Option<String>,
}

/// A learner's answer to a proposed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Intent {
    Confirm,
    Reject,
    Unclear,
}

impl From<String> for Intent {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "confirm" => Intent::Confirm,
            "reject" => Intent::Reject,
            _ => Intent::Unclear,
        }
    }
}

impl Intent {
    /// Guess intent from keywords when no classifier is available.
    ///
    /// Rejection wins over confirmation. Latin keywords match whole words;
    /// CJK keywords match anywhere.
    pub fn from_keywords(text: &str) -> Self {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let hit = |keywords: &[&str], phrases: &[&str]| {
            keywords.iter().any(|k| words.contains(k)) || phrases.iter().any(|p| lower.contains(p))
        };

        if hit(REJECT_WORDS, REJECT_PHRASES) {
            Intent::Reject
        } else if hit(CONFIRM_WORDS, CONFIRM_PHRASES) {
            Intent::Confirm
        } else {
            Intent::Unclear
        }
    }
}

#[derive(Debug, Deserialize)]
struct IntentReply {
    intent: Intent,
}

/// Builds learning blueprints through the goal-elicitor, content-analyzer
/// and intent-classifier roles.
#[derive(Debug, Clone)]
pub struct BlueprintElicitor {
    analysis_policy: RetryPolicy,
}

impl BlueprintElicitor {
    pub fn new(analysis_policy: RetryPolicy) -> Self {
        Self { analysis_policy }
    }

    /// Run one conversational elicitation turn, updating `blueprint`.
    pub async fn elicit(
        &self,
        port: &dyn AgentPort,
        blueprint: &mut LearningBlueprint,
        user_text: &str,
        history: &[Turn],
    ) -> Elicitation {
        let start = history.len().saturating_sub(ELICITATION_HISTORY);
        let context = json!({
            "blueprint": blueprint,
            "user_message": user_text,
            "conversation_history": &history[start..],
        });

        let reply = port.complete(AgentRole::GoalElicitor, context).await;
        let update = match reply.decode::<BlueprintUpdate>() {
            Ok(update) => update,
            Err(DecodeError::Failed(reason)) => return Elicitation::Failed(reason),
            Err(e) => {
                debug!(error = %e, "Elicitor reply is not a blueprint");
                return match reply.text() {
                    Some(text) => Elicitation::Unparsed(text),
                    None => Elicitation::Failed(e.to_string()),
                };
            }
        };

        blueprint.apply(update);
        debug!(status = ?blueprint.status, topic = ?blueprint.topic, "Blueprint updated");

        if blueprint.status == BlueprintStatus::Complete {
            info!(topic = ?blueprint.topic, sub_topics = blueprint.sub_topics.len(), "Blueprint complete");
            Elicitation::Complete
        } else {
            Elicitation::Ask(
                blueprint
                    .next_question
                    .clone()
                    .unwrap_or_else(|| "What would you like to learn?".to_string()),
            )
        }
    }

    /// Propose a blueprint from uploaded material.
    pub async fn analyze(
        &self,
        port: &dyn AgentPort,
        material: &str,
    ) -> Result<(LearningBlueprint, String), DecodeError> {
        let analysis = self
            .analysis_policy
            .run(|attempt| async move {
                let reply = port
                    .complete(AgentRole::ContentAnalyzer, json!({ "material": material }))
                    .await;
                match reply.decode::<ContentAnalysis>() {
                    Ok(analysis) => Attempt::Accept(analysis),
                    Err(e) => {
                        warn!(attempt = attempt.number, error = %e, "Content analysis unusable");
                        Attempt::Retry(e)
                    }
                }
            })
            .await
            .map_err(|e| e.into_inner())?;

        let mut blueprint = LearningBlueprint::from_update(analysis.learning_blueprint);
        blueprint.status = BlueprintStatus::PendingConfirmation;

        let summary = analysis
            .user_facing_summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| {
                format!(
                    "I analyzed your material.\n\n{}\n\nShall we start with this plan?",
                    blueprint.summary()
                )
            });

        info!(topic = ?blueprint.topic, sub_topics = blueprint.sub_topics.len(), "Material analyzed");
        Ok((blueprint, summary))
    }

    /// Classify a reply to a proposed plan.
    ///
    /// Falls back to keywords when the classifier fails outright; an
    /// answer that cannot be read counts as unclear.
    pub async fn classify_intent(&self, port: &dyn AgentPort, user_text: &str) -> Intent {
        let reply = port
            .complete(AgentRole::IntentClassifier, json!({ "reply": user_text }))
            .await;

        if let AgentReply::Failure(reason) = &reply {
            let intent = Intent::from_keywords(user_text);
            warn!(reason = %reason, intent = ?intent, "Intent classifier failed, using keywords");
            return intent;
        }

        reply
            .decode::<IntentReply>()
            .map(|r| r.intent)
            .unwrap_or(Intent::Unclear)
    }
}

impl Default for BlueprintElicitor {
    fn default() -> Self {
        Self::new(RetryPolicy::new(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedAgent;
    use serde_json::json;

    #[test]
    fn test_keyword_intent() {
        assert_eq!(Intent::from_keywords("Yes, let's go"), Intent::Confirm);
        assert_eq!(Intent::from_keywords("no, change it"), Intent::Reject);
        assert_eq!(Intent::from_keywords("ok but adjust the order"), Intent::Reject);
        assert_eq!(Intent::from_keywords("好的，开始吧"), Intent::Confirm);
        assert_eq!(Intent::from_keywords("我想调整一下"), Intent::Reject);
        assert_eq!(Intent::from_keywords("know"), Intent::Unclear);
        assert_eq!(Intent::from_keywords("hmm"), Intent::Unclear);
    }

    #[tokio::test]
    async fn test_elicit_sets_topic_only() {
        let agent = ScriptedAgent::new().reply(
            AgentRole::GoalElicitor,
            AgentReply::Structured(json!({
                "status": "incomplete",
                "topic": "Graph Theory",
                "next_question": "Which parts of graph theory interest you?"
            })),
        );
        let mut blueprint = LearningBlueprint::default();

        let outcome = BlueprintElicitor::default()
            .elicit(&agent, &mut blueprint, "I want graph theory", &[])
            .await;

        assert_eq!(
            outcome,
            Elicitation::Ask("Which parts of graph theory interest you?".into())
        );
        assert_eq!(blueprint.topic.as_deref(), Some("Graph Theory"));
        assert_eq!(blueprint.status, BlueprintStatus::Incomplete);
    }

    #[tokio::test]
    async fn test_elicit_surfaces_raw_text() {
        let agent = ScriptedAgent::new().reply(
            AgentRole::GoalElicitor,
            AgentReply::RawText("Could you tell me more?".into()),
        );
        let mut blueprint = LearningBlueprint::default();

        let outcome = BlueprintElicitor::default()
            .elicit(&agent, &mut blueprint, "hi", &[])
            .await;

        assert_eq!(outcome, Elicitation::Unparsed("Could you tell me more?".into()));
        assert_eq!(blueprint, LearningBlueprint::default());
    }

    #[tokio::test]
    async fn test_analyze_builds_pending_blueprint() {
        let agent = ScriptedAgent::new().reply(
            AgentRole::ContentAnalyzer,
            AgentReply::RawText(
                "Here you go: {\"learning_blueprint\": {\"topic\": \"Sorting\", \"sub_topics\": [\"Quicksort\"]}}"
                    .into(),
            ),
        );

        let (blueprint, summary) = BlueprintElicitor::default()
            .analyze(&agent, "chapter 3: sorting")
            .await
            .unwrap();

        assert_eq!(blueprint.status, BlueprintStatus::PendingConfirmation);
        assert_eq!(blueprint.sub_topics, vec!["Quicksort"]);
        assert!(summary.contains("Quicksort"));
        assert_eq!(agent.calls(AgentRole::ContentAnalyzer), 1);
    }

    #[tokio::test]
    async fn test_analyze_retries_within_budget() {
        let agent = ScriptedAgent::new()
            .reply(AgentRole::ContentAnalyzer, AgentReply::RawText("nope".into()))
            .reply(
                AgentRole::ContentAnalyzer,
                AgentReply::Structured(json!({
                    "learning_blueprint": {"topic": "Sorting"},
                    "user_facing_summary": "Sorting it is. Ready?"
                })),
            );

        let elicitor = BlueprintElicitor::new(RetryPolicy::new(2));
        let (_, summary) = elicitor.analyze(&agent, "text").await.unwrap();
        assert_eq!(summary, "Sorting it is. Ready?");

        let single = BlueprintElicitor::default();
        let agent = ScriptedAgent::new().reply(AgentRole::ContentAnalyzer, AgentReply::RawText("nope".into()));
        assert!(single.analyze(&agent, "text").await.is_err());
    }

    #[tokio::test]
    async fn test_classify_intent_paths() {
        let elicitor = BlueprintElicitor::default();

        let agent = ScriptedAgent::new().reply(
            AgentRole::IntentClassifier,
            AgentReply::Structured(json!({"intent": "reject"})),
        );
        assert_eq!(elicitor.classify_intent(&agent, "sure").await, Intent::Reject);

        let agent = ScriptedAgent::new().reply(
            AgentRole::IntentClassifier,
            AgentReply::Failure("offline".into()),
        );
        assert_eq!(elicitor.classify_intent(&agent, "yes please").await, Intent::Confirm);

        let agent = ScriptedAgent::new().reply(
            AgentRole::IntentClassifier,
            AgentReply::RawText("I think they agree".into()),
        );
        assert_eq!(elicitor.classify_intent(&agent, "yes").await, Intent::Unclear);
    }
}
