//! The agent port consumed by the tutoring engine.

use async_trait::async_trait;
use serde_json::Value;

use crate::reply::AgentReply;
use crate::role::AgentRole;

/// Something that can answer a role call.
///
/// Implementations never return an error: transport problems and empty
/// answers come back as [`AgentReply::Failure`] so callers handle every
/// outcome in one match.
#[async_trait]
pub trait AgentPort: Send + Sync {
    async fn complete(&self, role: AgentRole, context: Value) -> AgentReply;
}
