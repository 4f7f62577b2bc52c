//! Configuration for the tutoring engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The YAML could not be parsed
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value is out of its allowed range
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Configuration for one tutoring engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Learner this engine serves
    pub user_id: String,
    /// Storage locations
    pub storage: StorageConfig,
    /// Concept sequencing
    pub planner: PlannerConfig,
    /// Knowledge-base synthesis
    pub synthesis: SynthesisConfig,
    /// Uploaded-material analysis
    pub analysis: AnalysisConfig,
    /// Topic resolution
    pub resolution: ResolutionConfig,
    /// Mastery nudges applied by the strategy dispatcher
    pub strategy: StrategyConfig,
    /// General settings
    pub general: GeneralConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_id: "default_user".to_string(),
            storage: StorageConfig::default(),
            planner: PlannerConfig::default(),
            synthesis: SynthesisConfig::default(),
            analysis: AnalysisConfig::default(),
            resolution: ResolutionConfig::default(),
            strategy: StrategyConfig::default(),
            general: GeneralConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new config for a learner.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Put both storage directories under one data root.
    pub fn with_data_dir(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.storage.knowledge_dir = root.join("knowledge_bases");
        self.storage.review_dir = root.join("reviews");
        self
    }

    /// Load config from YAML and check it.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "user_id",
                reason: "must not be empty".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.planner.mastery_threshold) {
            return Err(ConfigError::Invalid {
                field: "planner.mastery_threshold",
                reason: format!("{} is outside [0, 1]", self.planner.mastery_threshold),
            });
        }
        if self.synthesis.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "synthesis.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.analysis.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "analysis.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        for (field, cutoff) in [
            ("resolution.load_cutoff", self.resolution.load_cutoff),
            ("resolution.validity_cutoff", self.resolution.validity_cutoff),
        ] {
            if !(0.0..=1.0).contains(&cutoff) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{} is outside [0, 1]", cutoff),
                });
            }
        }
        Ok(())
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// One JSON file per topic
    pub knowledge_dir: PathBuf,
    /// One JSON deck file per learner
    pub review_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            knowledge_dir: PathBuf::from("knowledge_bases"),
            review_dir: PathBuf::from("reviews"),
        }
    }
}

/// Planner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Mastery at or above which a concept counts as learned
    pub mastery_threshold: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: 0.75,
        }
    }
}

/// Synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Generation attempts before giving up
    pub max_attempts: u32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

/// Content analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Analyzer calls before reporting the material as unusable
    pub max_attempts: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { max_attempts: 1 }
    }
}

/// Topic resolution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Similarity cutoff when loading a collection
    pub load_cutoff: f64,
    /// Similarity cutoff for the pre-flight validity check
    pub validity_cutoff: f64,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            load_cutoff: 0.6,
            validity_cutoff: 0.8,
        }
    }
}

/// Mastery adjustments made by the strategy dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Subtracted on review_and_clarify
    pub review_penalty: f64,
    /// Assumed mastery for review_and_clarify when none is recorded
    pub review_prior: f64,
    /// Added on consolidate_and_verify and socratic_guidance
    pub consolidate_bonus: f64,
    /// Assumed mastery for those strategies when none is recorded
    pub consolidate_prior: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            review_penalty: 0.2,
            review_prior: 0.1,
            consolidate_bonus: 0.2,
            consolidate_prior: 0.0,
        }
    }
}

/// General configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
