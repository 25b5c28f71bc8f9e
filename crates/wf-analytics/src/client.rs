//! Completion client abstraction and retry policy.

use crate::error::{AnalyticsError, AnalyticsResult};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use wf_core::AnalyticsConfig;

/// A chat-completion backend. Implementations wrap a real model API; tests
/// use scripted fakes.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> AnalyticsResult<String>;
}

/// Bounded exponential backoff for completion calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self {
            attempts: config.retry_attempts.max(1),
            base_delay: config.retry_base(),
            max_delay: config.retry_max(),
        }
    }

    /// Run `op` up to `attempts` times, sleeping `base_delay * 2^(n-1)`
    /// capped at `max_delay` between tries. The last error wins.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> AnalyticsResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AnalyticsResult<T>>,
    {
        let mut delay = self.base_delay;
        let mut last_err = None;
        for attempt in 1..=self.attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    log::warn!(
                        "completion attempt {}/{} failed: {}",
                        attempt,
                        self.attempts,
                        err
                    );
                    last_err = Some(err);
                    if attempt < self.attempts {
                        tokio::time::sleep(delay).await;
                        delay = (delay * 2).min(self.max_delay);
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| AnalyticsError::Service("no attempts made".to_string())))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AnalyticsConfig::default())
    }
}

/// Client used when no completion backend is configured. Every call fails,
/// so text-analytics nodes fail cleanly instead of hanging.
pub struct NullCompletionClient;

#[async_trait]
impl CompletionClient for NullCompletionClient {
    async fn complete(&self, _system: &str, _user: &str) -> AnalyticsResult<String> {
        Err(AnalyticsError::Service(
            "no completion client is configured; text analytics nodes require one".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            attempts: 4,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        };
        let result = policy
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(AnalyticsError::Service("flaky".to_string()))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(result, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_with_last_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let err = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(AnalyticsError::Service("down".to_string())) }
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(err, AnalyticsError::Service(_)));
    }

    #[tokio::test]
    async fn test_null_client_always_fails() {
        let err = NullCompletionClient
            .complete("sys", "user")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::Service(_)));
    }
}
