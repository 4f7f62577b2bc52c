//! Configuration file for the mentor binary.

use std::path::Path;

use serde::{Deserialize, Serialize};

use mentor_agent::ServiceConfig;
use mentor_engine::EngineConfig;

/// Whole-file configuration: the engine plus the model backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub engine: EngineConfig,
    pub backend: BackendConfig,
}

/// OpenAI-compatible endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL up to and including `/v1`
    pub base_url: String,
    pub model: String,
    /// Bearer key; local servers usually need none
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Keep an in-memory audit log of agent calls
    pub audit_enabled: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama3.1".to_string(),
            api_key: None,
            max_tokens: 2048,
            temperature: 0.5,
            audit_enabled: true,
        }
    }
}

impl BackendConfig {
    /// Agent service settings for a learner.
    pub fn service_config(&self, user_id: &str) -> ServiceConfig {
        ServiceConfig {
            requester_id: user_id.to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            audit_enabled: self.audit_enabled,
            ..ServiceConfig::default()
        }
    }
}

impl CliConfig {
    /// Read a YAML file, or fall back to defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
