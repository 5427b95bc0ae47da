//! Mock provider implementation for testing.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What the mock does when asked to generate.
#[derive(Debug, Clone)]
enum Behavior {
    Reply(Option<String>),
    Fail(MockFailure),
    Hang,
}

/// Failure a [`MockTextProvider`] reports.
#[derive(Debug, Clone, Copy)]
pub enum MockFailure {
    Network,
    RateLimited,
    ContentFiltered,
}

/// Scriptable text provider that records every prompt it receives.
pub struct MockTextProvider {
    behavior: Behavior,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockTextProvider {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Reply(Some(text.into())))
    }

    /// Answer successfully but without any text part.
    pub fn empty() -> Self {
        Self::with_behavior(Behavior::Reply(None))
    }

    /// Always fail with `failure`.
    pub fn failing(failure: MockFailure) -> Self {
        Self::with_behavior(Behavior::Fail(failure))
    }

    /// Never complete.
    pub fn hanging() -> Self {
        Self::with_behavior(Behavior::Hang)
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match &self.behavior {
            Behavior::Reply(text) => Ok(ProviderResponse {
                text: text.clone(),
                input_tokens: prompt.len() as i32 / 4,
                output_tokens: text.as_ref().map(|t| t.len() as i32 / 4).unwrap_or(0),
                finish_reason: FinishReason::Complete,
            }),
            Behavior::Fail(MockFailure::Network) => Err(ProviderError::NetworkError(
                "connection refused".to_string(),
            )),
            Behavior::Fail(MockFailure::RateLimited) => Err(ProviderError::RateLimited),
            Behavior::Fail(MockFailure::ContentFiltered) => Err(ProviderError::ContentFiltered),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ProviderError::NetworkError("mock hang elapsed".to_string()))
            }
        }
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
