//! Mentor Agent - role-based access to language model services
//!
//! The tutoring engine never talks to a model directly. Every piece of
//! natural-language work (eliciting goals, designing concepts, choosing a
//! teaching strategy, writing flashcards) is a call to an [`AgentPort`] with
//! a fixed [`AgentRole`] and a JSON context, answered by an [`AgentReply`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              AgentService               │
//! │   (role prompt + context -> reply)      │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┴───────────┐
//!      ▼                       ▼
//! ┌─────────────┐       ┌─────────────┐
//! │ LlmBackend  │       │  AuditLog   │
//! │ (OpenAI /   │       │             │
//! │  Mock)      │       │             │
//! └─────────────┘       └─────────────┘
//! ```

pub mod audit;
pub mod backend;
pub mod port;
pub mod reply;
pub mod request;
pub mod role;
pub mod service;
pub mod types;

// Re-export main types for convenience
pub use backend::traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError};
pub use backend::{MockBackend, OpenAiBackend};
pub use port::AgentPort;
pub use reply::{AgentReply, DecodeError};
pub use request::AgentRequest;
pub use role::{AgentRole, ReplyFormat};
pub use service::{AgentService, ServiceConfig, ServiceError};
pub use types::CallCost;
