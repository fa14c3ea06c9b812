//! Failover gateway
//!
//! Walks the provider chain for every request: the agent's preferred
//! provider first, then the remaining providers in the fixed global
//! priority order. Providers that recently failed sit in a cooldown and
//! are moved to the back of the attempt list, so a healthy provider is
//! always tried before a cooling one.

use super::ProviderAdapter;
use council_application::ports::provider_gateway::{
    CompletionRequest, GatewayError, ProviderGateway,
};
use council_domain::ProviderId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const DEFAULT_COOLDOWN: Duration = Duration::from_secs(20);
const MIN_COOLDOWN: Duration = Duration::from_secs(1);
const MAX_COOLDOWN: Duration = Duration::from_secs(300);

/// Tracks which providers recently failed and should be deprioritized.
pub struct CooldownRegistry {
    expiries: Mutex<HashMap<ProviderId, Instant>>,
    duration: Duration,
}

impl CooldownRegistry {
    pub fn new(duration: Duration) -> Self {
        Self {
            expiries: Mutex::new(HashMap::new()),
            duration: duration.clamp(MIN_COOLDOWN, MAX_COOLDOWN),
        }
    }

    pub fn is_cooling(&self, provider: ProviderId) -> bool {
        let mut expiries = self.expiries.lock().unwrap();
        match expiries.get(&provider) {
            Some(expiry) if Instant::now() < *expiry => true,
            Some(_) => {
                expiries.remove(&provider);
                false
            }
            None => false,
        }
    }

    pub fn start(&self, provider: ProviderId) {
        self.expiries
            .lock()
            .unwrap()
            .insert(provider, Instant::now() + self.duration);
    }

    pub fn clear(&self, provider: ProviderId) {
        self.expiries.lock().unwrap().remove(&provider);
    }
}

impl Default for CooldownRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

/// Gateway that implements the provider chain with failover
pub struct FailoverGateway {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    cooldowns: CooldownRegistry,
}

impl FailoverGateway {
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self {
            adapters,
            cooldowns: CooldownRegistry::default(),
        }
    }

    pub fn with_cooldown(mut self, duration: Duration) -> Self {
        self.cooldowns = CooldownRegistry::new(duration);
        self
    }

    /// Attempt order for a request: preferred provider first, then the
    /// global priority order, with cooling providers rotated to the back.
    /// When everything is cooling the base order stands, so a request is
    /// still attempted rather than rejected outright.
    fn attempt_order(&self, preferred: ProviderId) -> Vec<Arc<dyn ProviderAdapter>> {
        let mut base: Vec<Arc<dyn ProviderAdapter>> = Vec::with_capacity(self.adapters.len());
        for id in std::iter::once(preferred)
            .chain(ProviderId::PRIORITY.into_iter().filter(|p| *p != preferred))
        {
            if let Some(adapter) = self.adapters.iter().find(|a| a.id() == id) {
                base.push(Arc::clone(adapter));
            }
        }

        let (healthy, cooling): (Vec<_>, Vec<_>) = base
            .into_iter()
            .partition(|a| !self.cooldowns.is_cooling(a.id()));
        healthy.into_iter().chain(cooling).collect()
    }
}

#[async_trait]
impl ProviderGateway for FailoverGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let order = self.attempt_order(request.preferred_provider);
        let mut failures: Vec<String> = Vec::new();

        for adapter in order {
            let id = adapter.id();
            if !adapter.has_credential() {
                self.cooldowns.start(id);
                failures.push(GatewayError::MissingCredential(id).to_string());
                continue;
            }
            debug!(provider = %id, model = %request.model, "attempting completion");
            match adapter.complete(request).await {
                Ok(raw) => {
                    self.cooldowns.clear(id);
                    return Ok(raw);
                }
                Err(e) if e.is_retryable() => {
                    warn!(provider = %id, error = %e, "provider failed; trying next");
                    self.cooldowns.start(id);
                    failures.push(e.to_string());
                }
                // Non-retryable failures would not be fixed by another
                // provider; surface them directly.
                Err(e) => return Err(e),
            }
        }

        Err(GatewayError::AllProvidersFailed {
            summary: if failures.is_empty() {
                "no providers configured".to_string()
            } else {
                failures.join("; ")
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -- Mock ProviderAdapter --------------------------------------------------

    struct MockProvider {
        id: ProviderId,
        credential: bool,
        response: Result<String, fn(ProviderId) -> GatewayError>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn healthy(id: ProviderId) -> Arc<Self> {
            Arc::new(Self {
                id,
                credential: true,
                response: Ok(format!("answer from {id}")),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(id: ProviderId, error: fn(ProviderId) -> GatewayError) -> Arc<Self> {
            Arc::new(Self {
                id,
                credential: true,
                response: Err(error),
                calls: AtomicUsize::new(0),
            })
        }

        fn without_credential(id: ProviderId) -> Arc<Self> {
            Arc::new(Self {
                id,
                credential: false,
                response: Ok(String::new()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderAdapter for MockProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn has_credential(&self) -> bool {
            self.credential
        }

        fn resolve_model(&self, requested: &str) -> String {
            requested.to_string()
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make(self.id)),
            }
        }
    }

    fn request(preferred: ProviderId) -> CompletionRequest {
        CompletionRequest::new("system", "user", "claude-sonnet-4-5").with_provider(preferred)
    }

    #[tokio::test]
    async fn test_preferred_provider_answers_first() {
        let anthropic = MockProvider::healthy(ProviderId::Anthropic);
        let openai = MockProvider::healthy(ProviderId::OpenAi);
        let gateway = FailoverGateway::new(vec![anthropic.clone(), openai.clone()]);

        let answer = gateway.complete(&request(ProviderId::OpenAi)).await.unwrap();
        assert_eq!(answer, "answer from openai");
        assert_eq!(anthropic.calls(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_fails_over_in_priority_order() {
        let anthropic = MockProvider::failing(ProviderId::Anthropic, GatewayError::RateLimited);
        let openai = MockProvider::healthy(ProviderId::OpenAi);
        let openrouter = MockProvider::healthy(ProviderId::OpenRouter);
        let gateway =
            FailoverGateway::new(vec![anthropic.clone(), openrouter.clone(), openai.clone()]);

        let answer = gateway
            .complete(&request(ProviderId::Anthropic))
            .await
            .unwrap();
        assert_eq!(answer, "answer from openai");
        assert_eq!(anthropic.calls(), 1);
        assert_eq!(openrouter.calls(), 0);
    }

    #[tokio::test]
    async fn test_cooling_provider_moves_to_back() {
        let anthropic = MockProvider::failing(ProviderId::Anthropic, GatewayError::RateLimited);
        let openai = MockProvider::healthy(ProviderId::OpenAi);
        let gateway = FailoverGateway::new(vec![anthropic.clone(), openai.clone()]);

        // First request trips the anthropic cooldown
        gateway
            .complete(&request(ProviderId::Anthropic))
            .await
            .unwrap();
        assert_eq!(anthropic.calls(), 1);

        // While cooling, anthropic is not attempted even as the preferred
        gateway
            .complete(&request(ProviderId::Anthropic))
            .await
            .unwrap();
        assert_eq!(anthropic.calls(), 1);
        assert_eq!(openai.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_credential_skips_without_calling() {
        let anthropic = MockProvider::without_credential(ProviderId::Anthropic);
        let openai = MockProvider::healthy(ProviderId::OpenAi);
        let gateway = FailoverGateway::new(vec![anthropic.clone(), openai.clone()]);

        let answer = gateway
            .complete(&request(ProviderId::Anthropic))
            .await
            .unwrap();
        assert_eq!(answer, "answer from openai");
        assert_eq!(anthropic.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_failed_lists_every_reason() {
        let anthropic = MockProvider::failing(ProviderId::Anthropic, GatewayError::RateLimited);
        let openai = MockProvider::failing(ProviderId::OpenAi, |id| GatewayError::Upstream {
            provider: id,
            status: 503,
        });
        let gateway = FailoverGateway::new(vec![anthropic, openai]);

        let err = gateway
            .complete(&request(ProviderId::Anthropic))
            .await
            .unwrap_err();
        match err {
            GatewayError::AllProvidersFailed { summary } => {
                assert!(summary.contains("Rate limited by anthropic"));
                assert!(summary.contains("Upstream error from openai"));
            }
            other => panic!("expected AllProvidersFailed, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_response_does_not_fail_over() {
        let anthropic = MockProvider::failing(ProviderId::Anthropic, |id| GatewayError::Malformed {
            provider: id,
            reason: "no content".to_string(),
        });
        let openai = MockProvider::healthy(ProviderId::OpenAi);
        let gateway = FailoverGateway::new(vec![anthropic, openai.clone()]);

        let err = gateway
            .complete(&request(ProviderId::Anthropic))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Malformed { .. }));
        assert_eq!(openai.calls(), 0);
    }

    #[test]
    fn test_cooldown_duration_clamped() {
        let registry = CooldownRegistry::new(Duration::from_secs(10_000));
        assert_eq!(registry.duration, MAX_COOLDOWN);
        let registry = CooldownRegistry::new(Duration::from_millis(1));
        assert_eq!(registry.duration, MIN_COOLDOWN);
    }
}
