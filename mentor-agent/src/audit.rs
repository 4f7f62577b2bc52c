//! Audit trail for agent calls.
//!
//! Records every role invocation and how it ended, newest first.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::request::AgentRequest;
use crate::role::AgentRole;
use crate::types::CallCost;

/// Maximum entries in the audit log before pruning.
const MAX_AUDIT_ENTRIES: usize = 10_000;

/// How an audited call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// The backend produced a reply
    Answered,
    /// The backend failed or no backend was available
    Failed,
}

/// An entry in the audit log.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// Unique entry ID
    pub entry_id: String,
    /// Request ID
    pub request_id: String,
    /// Role invoked
    pub role: AgentRole,
    /// Who made the request
    pub requester_id: String,
    /// Backend that handled the request
    pub backend_id: Option<String>,
    /// How the call ended
    pub outcome: Option<CallOutcome>,
    /// Failure reason, if any
    pub error: Option<String>,
    /// Token and time cost
    pub cost: Option<CallCost>,
    /// When the request was made
    pub requested_at: DateTime<Utc>,
    /// When the call finished
    pub finished_at: Option<DateTime<Utc>>,
}

impl AuditEntry {
    /// Create an entry from a request.
    pub fn from_request(request: &AgentRequest) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            request_id: request.request_id.clone(),
            role: request.role,
            requester_id: request.requester_id.clone(),
            backend_id: None,
            outcome: None,
            error: None,
            cost: None,
            requested_at: request.requested_at,
            finished_at: None,
        }
    }
}

/// Audit log for tracking all agent calls.
pub struct AuditLog {
    /// Log entries (newest first)
    entries: Arc<RwLock<VecDeque<AuditEntry>>>,
    /// Maximum entries to retain
    max_entries: usize,
}

impl AuditLog {
    /// Create a new audit log.
    pub fn new() -> Self {
        Self::with_max_entries(MAX_AUDIT_ENTRIES)
    }

    /// Create with custom max entries.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            max_entries,
        }
    }

    /// Log a request (before processing).
    pub async fn log_request(&self, request: &AgentRequest) -> String {
        let entry = AuditEntry::from_request(request);
        let entry_id = entry.entry_id.clone();

        let mut entries = self.entries.write().await;
        entries.push_front(entry);

        while entries.len() > self.max_entries {
            entries.pop_back();
        }

        entry_id
    }

    /// Record a successful call.
    pub async fn log_answer(&self, entry_id: &str, backend_id: &str, cost: CallCost) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.iter_mut().find(|e| e.entry_id == entry_id) {
            entry.backend_id = Some(backend_id.to_string());
            entry.outcome = Some(CallOutcome::Answered);
            entry.cost = Some(cost);
            entry.finished_at = Some(Utc::now());
        }
    }

    /// Record a failed call.
    pub async fn log_failure(&self, entry_id: &str, backend_id: Option<&str>, error: &str) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.iter_mut().find(|e| e.entry_id == entry_id) {
            entry.backend_id = backend_id.map(str::to_string);
            entry.outcome = Some(CallOutcome::Failed);
            entry.error = Some(error.to_string());
            entry.finished_at = Some(Utc::now());
        }
    }

    /// Get recent entries.
    pub async fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries.iter().take(limit).cloned().collect()
    }

    /// Get statistics.
    pub async fn stats(&self) -> AuditStats {
        let entries = self.entries.read().await;

        let answered = entries
            .iter()
            .filter(|e| e.outcome == Some(CallOutcome::Answered))
            .count();
        let failed = entries
            .iter()
            .filter(|e| e.outcome == Some(CallOutcome::Failed))
            .count();
        let total_tokens = entries
            .iter()
            .filter_map(|e| e.cost.as_ref())
            .map(|c| u64::from(c.total_tokens()))
            .sum();

        AuditStats {
            total_calls: entries.len(),
            answered,
            failed,
            total_tokens,
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics from the audit log.
#[derive(Debug, Clone)]
pub struct AuditStats {
    /// Total calls logged
    pub total_calls: usize,
    /// Calls that produced a reply
    pub answered: usize,
    /// Calls that failed
    pub failed: usize,
    /// Tokens consumed across answered calls
    pub total_tokens: u64,
}
