//! Agent request type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::role::AgentRole;

/// One call to an agent role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    /// Unique request identifier
    pub request_id: String,
    /// Role being invoked
    pub role: AgentRole,
    /// Role-specific context, sent to the model as JSON
    pub context: Value,
    /// Who the call is made on behalf of
    pub requester_id: String,
    /// When the request was made
    pub requested_at: DateTime<Utc>,
}

impl AgentRequest {
    /// Create a new request.
    pub fn new(role: AgentRole, context: Value) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            role,
            context,
            requester_id: "anonymous".to_string(),
            requested_at: Utc::now(),
        }
    }

    /// Set the requester.
    pub fn with_requester(mut self, requester_id: impl Into<String>) -> Self {
        self.requester_id = requester_id.into();
        self
    }

    /// Render the context as the user message for the model.
    ///
    /// String contexts are sent verbatim; everything else is pretty JSON.
    pub fn user_prompt(&self) -> String {
        match &self.context {
            Value::String(text) => text.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}
