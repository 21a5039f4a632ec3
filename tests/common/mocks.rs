//! Mock implementations for testing.

use async_trait::async_trait;
use std::sync::Mutex;
use trendscout::types::{AppError, Result};
use trendscout::LLMClient;

/// Mock LLM client with a fixed reply, or one that always fails.
///
/// Records every `(system, prompt)` pair it receives.
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl MockLLMClient {
    /// Create a mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            should_fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
