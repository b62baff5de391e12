//! LLM Router
//!
//! Wraps the configured providers behind a single `LLMProvider`. Each call is
//! tried against the primary provider first, retried up to `max_attempts`
//! times, and then handed to the fallbacks in configuration order. Every
//! attempt is bounded by a timeout.

use async_trait::async_trait;
use sdk::ToolSpec;
use std::time::Duration;

use super::{LLMError, LLMProvider, LLMResponse, Message, Result};
use crate::config::LLMConfig;

/// LLM Router that retries and fails over between providers
pub struct LLMRouter {
    /// Providers in priority order
    providers: Vec<Box<dyn LLMProvider>>,

    /// Attempts per provider before moving to the next one
    max_attempts: u32,

    /// Upper bound for a single attempt
    timeout: Duration,

    /// Pause between attempts against the same provider
    retry_delay: Duration,
}

impl LLMRouter {
    /// Create a new LLM router
    ///
    /// # Arguments
    /// * `providers` - Providers in priority order, primary first
    /// * `config` - LLM configuration supplying attempts and timeout
    pub fn new(providers: Vec<Box<dyn LLMProvider>>, config: &LLMConfig) -> Self {
        Self {
            providers,
            max_attempts: config.max_attempts.max(1),
            timeout: Duration::from_secs(config.timeout_secs),
            retry_delay: Duration::from_millis(500),
        }
    }

    /// Override the pause between attempts
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Number of providers behind this router
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider is configured
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Check the health of all registered providers
    /// Returns a list of (provider_name, is_healthy)
    pub async fn health_report(&self) -> Vec<(&str, bool)> {
        let mut results = Vec::new();
        for provider in &self.providers {
            let is_healthy = provider.check_health().await;
            results.push((provider.name(), is_healthy));
        }
        results
    }
}

#[async_trait]
impl LLMProvider for LLMRouter {
    fn name(&self) -> &str {
        "router"
    }

    async fn generate(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LLMResponse> {
        if self.providers.is_empty() {
            return Err(LLMError::ProviderUnavailable(
                "No LLM providers configured".to_string(),
            ));
        }

        let mut last_error = None;

        for provider in &self.providers {
            for attempt in 1..=self.max_attempts {
                tracing::debug!(
                    "Attempting provider: {} (attempt {}/{}, timeout: {}s)",
                    provider.name(),
                    attempt,
                    self.max_attempts,
                    self.timeout.as_secs()
                );

                let result =
                    tokio::time::timeout(self.timeout, provider.generate(messages, tools)).await;

                match result {
                    Ok(Ok(response)) => {
                        tracing::debug!("Provider {} succeeded", provider.name());
                        return Ok(response);
                    }
                    Ok(Err(e)) => {
                        tracing::warn!("Provider {} failed: {}", provider.name(), e);
                        last_error = Some(e);
                    }
                    Err(_) => {
                        tracing::warn!(
                            "Provider {} timed out after {}s",
                            provider.name(),
                            self.timeout.as_secs()
                        );
                        last_error = Some(LLMError::Timeout);
                    }
                }

                if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }

        tracing::error!("All LLM providers exhausted");
        Err(LLMError::ProviderUnavailable(format!(
            "All LLM providers failed (last error: {})",
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "none".to_string())
        )))
    }

    async fn check_health(&self) -> bool {
        for provider in &self.providers {
            if provider.check_health().await {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FinalAnswer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fails the first `failures` calls, then answers with its name
    struct FlakyProvider {
        name: String,
        failures: usize,
        calls: Arc<AtomicUsize>,
    }

    impl FlakyProvider {
        fn new(name: &str, failures: usize) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name: name.to_string(),
                    failures,
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl LLMProvider for FlakyProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn generate(&self, _messages: &[Message], _tools: &[ToolSpec]) -> Result<LLMResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(LLMError::NetworkError("connection reset".into()))
            } else {
                Ok(LLMResponse::FinalAnswer(FinalAnswer::new(self.name.clone())))
            }
        }
    }

    /// Never answers within any reasonable timeout
    struct StuckProvider;

    #[async_trait]
    impl LLMProvider for StuckProvider {
        fn name(&self) -> &str {
            "stuck"
        }

        async fn generate(&self, _messages: &[Message], _tools: &[ToolSpec]) -> Result<LLMResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(LLMError::Timeout)
        }
    }

    fn config(max_attempts: u32, timeout_secs: u64) -> LLMConfig {
        LLMConfig {
            max_attempts,
            timeout_secs,
            ..Default::default()
        }
    }

    fn answer_of(response: LLMResponse) -> String {
        match response {
            LLMResponse::FinalAnswer(answer) => answer.content,
            LLMResponse::ToolCall(call) => panic!("unexpected tool call {}", call.name),
        }
    }

    #[tokio::test]
    async fn test_no_providers_is_an_error() {
        let router = LLMRouter::new(vec![], &config(2, 5));
        assert!(router.is_empty());
        let err = router.generate(&[Message::user("hi")], &[]).await.unwrap_err();
        assert!(matches!(err, LLMError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_retries_same_provider_before_failover() {
        let (primary, primary_calls) = FlakyProvider::new("primary", 1);
        let (fallback, fallback_calls) = FlakyProvider::new("fallback", 0);
        let router = LLMRouter::new(vec![Box::new(primary), Box::new(fallback)], &config(2, 5))
            .with_retry_delay(Duration::ZERO);

        let response = router.generate(&[Message::user("hi")], &[]).await.unwrap();

        assert_eq!(answer_of(response), "primary");
        assert_eq!(primary_calls.load(Ordering::SeqCst), 2);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fails_over_after_exhausting_attempts() {
        let (primary, primary_calls) = FlakyProvider::new("primary", 10);
        let (fallback, _) = FlakyProvider::new("fallback", 0);
        let router = LLMRouter::new(vec![Box::new(primary), Box::new(fallback)], &config(3, 5))
            .with_retry_delay(Duration::ZERO);

        let response = router.generate(&[Message::user("hi")], &[]).await.unwrap();

        assert_eq!(answer_of(response), "fallback");
        assert_eq!(primary_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_all_failing_reports_last_error() {
        let (primary, _) = FlakyProvider::new("primary", 10);
        let router =
            LLMRouter::new(vec![Box::new(primary)], &config(1, 5)).with_retry_delay(Duration::ZERO);

        let err = router.generate(&[Message::user("hi")], &[]).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_moves_to_next_provider() {
        let (fallback, _) = FlakyProvider::new("fallback", 0);
        let router = LLMRouter::new(vec![Box::new(StuckProvider), Box::new(fallback)], &config(1, 1))
            .with_retry_delay(Duration::ZERO);

        let response = router.generate(&[Message::user("hi")], &[]).await.unwrap();
        assert_eq!(answer_of(response), "fallback");
    }
}
