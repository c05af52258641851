//! Bounded retry for transient completion failures.

use super::CompletionService;
use crate::conversation::ChatMessage;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

/// How many times to retry, and how long to wait between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `attempt` (1-based): grows linearly.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(500))
    }
}

/// Wraps a completion service and retries calls that fail with a retryable error.
///
/// Non-retryable errors are returned on the first failure.
pub struct RetryingCompletion<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: CompletionService> RetryingCompletion<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: CompletionService> CompletionService for RetryingCompletion<C> {
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> Result<String> {
        let mut retries = 0;

        loop {
            match self.inner.complete(messages, model).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && retries < self.policy.max_retries => {
                    retries += 1;
                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = self.policy.max_retries,
                        "Completion failed, retrying..."
                    );
                    sleep(self.policy.delay_for(retries)).await;
                }
                Err(e) => {
                    if retries > 0 {
                        error!(error = %e, retries, "Completion failed after retries");
                    }
                    return Err(e);
                }
            }
        }
    }
}
