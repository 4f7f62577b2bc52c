//! Mock LLM backend for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use super::traits::*;

/// One scripted outcome for the next `complete` call.
#[derive(Debug, Clone)]
enum Scripted {
    Content(String),
    Failure(String),
}

/// Mock backend for testing.
///
/// Answers from a FIFO script first, then falls back to the default
/// response. Records every request so tests can assert on prompts.
pub struct MockBackend {
    model_id: String,
    available: AtomicBool,
    capabilities: ModelCapabilities,
    response_content: String,
    script: Mutex<VecDeque<Scripted>>,
    last_request: Mutex<Option<CompletionRequest>>,
    call_count: AtomicU32,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            available: AtomicBool::new(true),
            capabilities: ModelCapabilities {
                supports_json_mode: true,
                ..ModelCapabilities::default()
            },
            response_content: "Mock response".to_string(),
            script: Mutex::new(VecDeque::new()),
            last_request: Mutex::new(None),
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the default response content.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.response_content = content.into();
        self
    }

    /// Queue replies to be returned in order before the default response.
    pub fn with_script<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for reply in replies {
            self.push_reply(reply);
        }
        self
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Set capabilities.
    pub fn with_capabilities(mut self, capabilities: ModelCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Append a reply to the script.
    pub fn push_reply(&self, content: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Scripted::Content(content.into()));
        }
    }

    /// Append a request failure to the script.
    pub fn push_failure(&self, message: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Scripted::Failure(message.into()));
        }
    }

    /// Number of scripted replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// The most recent request seen by `complete`.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }

    /// Get the number of times complete was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count.
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    fn next_scripted(&self) -> Option<Scripted> {
        self.script.lock().ok().and_then(|mut s| s.pop_front())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if !self.available.load(Ordering::SeqCst) {
            return Err(LlmError::Unavailable("Mock backend disabled".to_string()));
        }

        // Estimate token counts
        let prompt_tokens: u32 = request
            .messages
            .iter()
            .map(|m| m.content.len() as u32 / 4)
            .sum();

        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request);
        }

        let content = match self.next_scripted() {
            Some(Scripted::Content(content)) => content,
            Some(Scripted::Failure(message)) => return Err(LlmError::RequestFailed(message)),
            None => self.response_content.clone(),
        };

        let completion_tokens = content.len() as u32 / 4;

        Ok(CompletionResponse {
            content,
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens,
                completion_tokens,
            },
        })
    }

    fn capabilities(&self) -> &ModelCapabilities {
        &self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend() {
        let backend = MockBackend::new("test-model").with_response("Hello, world!");

        assert!(backend.is_available().await);
        assert_eq!(backend.call_count(), 0);

        let response = backend
            .complete(CompletionRequest::user("Hi"))
            .await
            .unwrap();

        assert_eq!(response.content, "Hello, world!");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let backend = MockBackend::new("test-model").with_available(false);

        assert!(!backend.is_available().await);

        let result = backend.complete(CompletionRequest::user("Hi")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_script_runs_before_default() {
        let backend = MockBackend::new("test-model")
            .with_response("fallback")
            .with_script(["first", "second"]);
        backend.push_failure("boom");

        let first = backend.complete(CompletionRequest::user("a")).await.unwrap();
        let second = backend.complete(CompletionRequest::user("b")).await.unwrap();
        let third = backend.complete(CompletionRequest::user("c")).await;
        let fourth = backend.complete(CompletionRequest::user("d")).await.unwrap();

        assert_eq!(first.content, "first");
        assert_eq!(second.content, "second");
        assert!(matches!(third, Err(LlmError::RequestFailed(_))));
        assert_eq!(fourth.content, "fallback");
        assert_eq!(backend.remaining(), 0);
        assert_eq!(backend.call_count(), 4);
    }

    #[tokio::test]
    async fn test_last_request_recorded() {
        let backend = MockBackend::default();
        backend
            .complete(CompletionRequest::user("remember me").with_system("sys"))
            .await
            .unwrap();

        let last = backend.last_request().unwrap();
        assert_eq!(last.system_prompt.as_deref(), Some("sys"));
        assert_eq!(last.messages[0].content, "remember me");
    }
}
