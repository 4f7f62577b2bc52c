//! AgentService - the backend-backed implementation of the agent port.
//!
//! Turns a role + JSON context into a completion request, sends it to the
//! first available backend, and classifies the answer as an [`AgentReply`].

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::audit::{AuditEntry, AuditLog, AuditStats};
use crate::backend::traits::{CompletionRequest, LlmBackend, LlmError};
use crate::port::AgentPort;
use crate::reply::AgentReply;
use crate::request::AgentRequest;
use crate::role::{AgentRole, ReplyFormat};
use crate::types::CallCost;

/// Error types for the service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No backend available
    #[error("No LLM backend available")]
    NoBackendAvailable,

    /// Backend error
    #[error("Backend error: {0}")]
    BackendError(#[from] LlmError),
}

/// Configuration for the AgentService.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Agent ID for this service
    pub agent_id: String,
    /// Requester recorded on calls made through the port
    pub requester_id: String,
    /// Maximum tokens per completion
    pub max_tokens: u32,
    /// Temperature for roles without their own override
    pub temperature: f32,
    /// Whether to log all requests
    pub audit_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            agent_id: uuid::Uuid::new_v4().to_string(),
            requester_id: "anonymous".to_string(),
            max_tokens: 2048,
            temperature: 0.5,
            audit_enabled: true,
        }
    }
}

/// Main entry point for agent invocation.
pub struct AgentService {
    config: ServiceConfig,
    backends: Vec<Arc<dyn LlmBackend>>,
    audit: Arc<AuditLog>,
}

impl AgentService {
    /// Create a new service with the given backends, tried in order.
    pub fn new(backends: Vec<Arc<dyn LlmBackend>>) -> Self {
        Self {
            config: ServiceConfig::default(),
            backends,
            audit: Arc::new(AuditLog::new()),
        }
    }

    /// Create with configuration.
    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the agent ID.
    pub fn agent_id(&self) -> &str {
        &self.config.agent_id
    }

    /// Invoke a role and classify the answer.
    pub async fn invoke(&self, request: AgentRequest) -> Result<AgentReply, ServiceError> {
        let entry_id = if self.config.audit_enabled {
            Some(self.audit.log_request(&request).await)
        } else {
            None
        };

        debug!(
            request_id = %request.request_id,
            role = %request.role,
            "Processing request"
        );

        let backend = match self.select_backend().await {
            Ok(backend) => backend,
            Err(e) => {
                if let Some(entry_id) = &entry_id {
                    self.audit.log_failure(entry_id, None, &e.to_string()).await;
                }
                return Err(e);
            }
        };

        let start = Instant::now();
        let completion = match backend.complete(self.build_completion(&request)).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(role = %request.role, backend = backend.id(), error = %e, "Backend call failed");
                if let Some(entry_id) = &entry_id {
                    self.audit
                        .log_failure(entry_id, Some(backend.id()), &e.to_string())
                        .await;
                }
                return Err(e.into());
            }
        };

        let cost = CallCost {
            input_tokens: completion.usage.prompt_tokens,
            output_tokens: completion.usage.completion_tokens,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        if let Some(entry_id) = &entry_id {
            self.audit.log_answer(entry_id, backend.id(), cost.clone()).await;
        }

        debug!(
            role = %request.role,
            tokens = cost.total_tokens(),
            elapsed_ms = cost.processing_time_ms,
            "Request completed"
        );

        Ok(classify(request.role, &completion.content))
    }

    /// Get recent audit entries.
    pub async fn get_audit_log(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit.recent(limit).await
    }

    /// Get audit statistics.
    pub async fn audit_stats(&self) -> AuditStats {
        self.audit.stats().await
    }

    /// Select the first available backend.
    async fn select_backend(&self) -> Result<Arc<dyn LlmBackend>, ServiceError> {
        for backend in &self.backends {
            if backend.is_available().await {
                return Ok(Arc::clone(backend));
            }
        }
        Err(ServiceError::NoBackendAvailable)
    }

    fn build_completion(&self, request: &AgentRequest) -> CompletionRequest {
        let role = request.role;
        let mut completion = CompletionRequest::user(request.user_prompt())
            .with_system(role.system_prompt())
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(role.temperature().unwrap_or(self.config.temperature));

        if role.reply_format() == ReplyFormat::Json {
            completion = completion.with_json_output();
        }
        completion
    }
}

/// Text roles never count as structured; JSON roles go through the usual
/// classification.
fn classify(role: AgentRole, content: &str) -> AgentReply {
    match role.reply_format() {
        ReplyFormat::Json => AgentReply::from_text(content),
        ReplyFormat::Text if content.trim().is_empty() => {
            AgentReply::Failure("empty reply".to_string())
        }
        ReplyFormat::Text => AgentReply::RawText(content.trim().to_string()),
    }
}

#[async_trait]
impl AgentPort for AgentService {
    async fn complete(&self, role: AgentRole, context: Value) -> AgentReply {
        let request = AgentRequest::new(role, context).with_requester(&self.config.requester_id);
        match self.invoke(request).await {
            Ok(reply) => {
                if let AgentReply::Failure(reason) = &reply {
                    info!(role = %role, reason = %reason, "Agent returned no usable reply");
                }
                reply
            }
            Err(e) => AgentReply::Failure(e.to_string()),
        }
    }
}
