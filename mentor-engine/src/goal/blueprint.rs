//! The learning blueprint: what the learner wants to learn and how.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// How far elicitation has come.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case", from = "String")]
pub enum BlueprintStatus {
    #[default]
    Incomplete,
    PendingConfirmation,
    Complete,
}

impl From<String> for BlueprintStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "complete" => BlueprintStatus::Complete,
            "pending_confirmation" => BlueprintStatus::PendingConfirmation,
            _ => BlueprintStatus::Incomplete,
        }
    }
}

/// The learner's current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Level {
    #[default]
    Unknown,
    Beginner,
    Intermediate,
    Advanced,
}

impl From<String> for Level {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "beginner" => Level::Beginner,
            "intermediate" => Level::Intermediate,
            "advanced" => Level::Advanced,
            _ => Level::Unknown,
        }
    }
}

/// How the learner prefers to be taught.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case", from = "String")]
pub enum LearningStyle {
    #[default]
    Unknown,
    Socratic,
    ExampleDriven,
    Direct,
}

impl From<String> for LearningStyle {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "socratic" => LearningStyle::Socratic,
            "example_driven" => LearningStyle::ExampleDriven,
            "direct" => LearningStyle::Direct,
            _ => LearningStyle::Unknown,
        }
    }
}

/// A learning goal, built up over several turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(default)]
pub struct LearningBlueprint {
    pub status: BlueprintStatus,
    pub topic: Option<String>,
    pub sub_topics: Vec<String>,
    pub current_level: Level,
    pub learning_style: LearningStyle,
    /// What to ask the learner next
    pub next_question: Option<String>,
}

impl LearningBlueprint {
    /// Whether topic and sub-topics are both filled in.
    pub fn is_populated(&self) -> bool {
        self.topic_name().is_some() && !self.sub_topics.is_empty()
    }

    /// Topic, if present and not blank.
    pub fn topic_name(&self) -> Option<&str> {
        self.topic
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Merge an update, then hold back `complete` until the blueprint is populated.
    pub fn apply(&mut self, update: BlueprintUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(topic) = update.topic {
            self.topic = Some(topic);
        }
        if let Some(sub_topics) = update.sub_topics {
            self.sub_topics = sub_topics;
        }
        if let Some(level) = update.current_level {
            self.current_level = level;
        }
        if let Some(style) = update.learning_style {
            self.learning_style = style;
        }
        if let Some(question) = update.next_question {
            self.next_question = Some(question);
        }

        if self.status == BlueprintStatus::Complete && !self.is_populated() {
            self.status = BlueprintStatus::Incomplete;
        }
    }

    /// Build a blueprint from scratch out of an update.
    pub fn from_update(update: BlueprintUpdate) -> Self {
        let mut blueprint = Self::default();
        blueprint.apply(update);
        blueprint
    }

    /// Mark the plan as agreed.
    pub fn confirm(&mut self) {
        self.status = BlueprintStatus::Complete;
    }

    /// Short plan description shown to the learner.
    pub fn summary(&self) -> String {
        let topic = self.topic_name().unwrap_or("your topic");
        if self.sub_topics.is_empty() {
            format!("Proposed plan: **{}**.", topic)
        } else {
            let items: Vec<String> = self.sub_topics.iter().map(|s| format!("- {}", s)).collect();
            format!("Proposed plan for **{}**:\n{}", topic, items.join("\n"))
        }
    }
}

/// Partial blueprint as returned by an agent; absent fields leave the
/// current value alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BlueprintUpdate {
    pub status: Option<BlueprintStatus>,
    pub topic: Option<String>,
    pub sub_topics: Option<Vec<String>>,
    pub current_level: Option<Level>,
    pub learning_style: Option<LearningStyle>,
    pub next_question: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_enums() {
        let update: BlueprintUpdate = serde_json::from_value(json!({
            "status": "Complete",
            "current_level": "expert",
            "learning_style": "example-driven"
        }))
        .unwrap();

        assert_eq!(update.status, Some(BlueprintStatus::Complete));
        assert_eq!(update.current_level, Some(Level::Unknown));
        assert_eq!(update.learning_style, Some(LearningStyle::ExampleDriven));
    }

    #[test]
    fn test_serializes_snake_case() {
        let blueprint = LearningBlueprint {
            status: BlueprintStatus::PendingConfirmation,
            learning_style: LearningStyle::ExampleDriven,
            ..Default::default()
        };
        let value = serde_json::to_value(&blueprint).unwrap();
        assert_eq!(value["status"], "pending_confirmation");
        assert_eq!(value["learning_style"], "example_driven");
        assert_eq!(value["topic"], serde_json::Value::Null);
    }

    #[test]
    fn test_apply_merges_and_guards_completion() {
        let mut blueprint = LearningBlueprint::default();
        blueprint.apply(BlueprintUpdate {
            status: Some(BlueprintStatus::Complete),
            topic: Some("Rust".into()),
            ..Default::default()
        });
        assert_eq!(blueprint.topic.as_deref(), Some("Rust"));
        assert_eq!(blueprint.status, BlueprintStatus::Incomplete);

        blueprint.apply(BlueprintUpdate {
            status: Some(BlueprintStatus::Complete),
            sub_topics: Some(vec!["Ownership".into()]),
            ..Default::default()
        });
        assert_eq!(blueprint.topic.as_deref(), Some("Rust"));
        assert_eq!(blueprint.status, BlueprintStatus::Complete);
    }

    #[test]
    fn test_blank_topic_is_not_populated() {
        let blueprint = LearningBlueprint {
            topic: Some("   ".into()),
            sub_topics: vec!["x".into()],
            ..Default::default()
        };
        assert!(!blueprint.is_populated());
        assert!(blueprint.summary().contains("your topic"));
    }
}
