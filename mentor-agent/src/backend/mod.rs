//! LLM backend abstraction layer.
//!
//! - OpenAI-compatible chat completions (vLLM, Ollama, OpenAI, SiliconFlow, ...)
//! - Mock backend for tests and offline demos

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::MockBackend;
pub use openai::OpenAiBackend;
pub use traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError, ModelCapabilities};
