//! Provider gateway port
//!
//! Defines the interface for completing prompts against an LLM provider.
//! Implementations (adapters, including the failover chain) live in the
//! infrastructure layer.

use council_domain::ProviderId;
use async_trait::async_trait;
use thiserror::Error;

/// A single completion request: a system prompt, a user prompt, and the
/// sampling parameters the agent profile asks for.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Ask the provider for machine-parseable output where it supports
    /// that natively; the extractor still handles providers that do not.
    pub structured: bool,
    /// Provider to try first; the gateway may fail over to others.
    pub preferred_provider: ProviderId,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            model: model.into(),
            temperature: 0.3,
            max_tokens: 2000,
            structured: true,
            preferred_provider: ProviderId::default(),
        }
    }

    pub fn with_structured(mut self, structured: bool) -> Self {
        self.structured = structured;
        self
    }

    pub fn with_sampling(mut self, temperature: f64, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.preferred_provider = provider;
        self
    }
}

/// Errors that can occur during gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Provider {provider} is not configured: {reason}")]
    Unconfigured { provider: ProviderId, reason: String },

    #[error("Missing credential for {0}")]
    MissingCredential(ProviderId),

    #[error("Rate limited by {0}")]
    RateLimited(ProviderId),

    #[error("Request to {0} timed out")]
    Timeout(ProviderId),

    #[error("Upstream error from {provider} (status {status})")]
    Upstream { provider: ProviderId, status: u16 },

    #[error("Connection to {provider} failed: {reason}")]
    Connection { provider: ProviderId, reason: String },

    #[error("Malformed response from {provider}: {reason}")]
    Malformed { provider: ProviderId, reason: String },

    #[error("All providers failed: {summary}")]
    AllProvidersFailed { summary: String },
}

impl GatewayError {
    /// Whether the failure is worth retrying on another provider.
    ///
    /// Rate limits, timeouts, upstream 5xx, connection resets, and
    /// configuration gaps all fail over; a malformed body from a healthy
    /// provider does not, since another provider would not fix the prompt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Unconfigured { .. }
                | GatewayError::MissingCredential(_)
                | GatewayError::RateLimited(_)
                | GatewayError::Timeout(_)
                | GatewayError::Upstream { .. }
                | GatewayError::Connection { .. }
        )
    }
}

/// Gateway for prompt completion
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Complete a request, returning the raw model output.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_default_to_structured_output() {
        let request = CompletionRequest::new("system", "user", "model");
        assert!(request.structured);
        assert!(!request.with_structured(false).structured);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(GatewayError::RateLimited(ProviderId::OpenAi).is_retryable());
        assert!(GatewayError::Timeout(ProviderId::Anthropic).is_retryable());
        assert!(
            GatewayError::Upstream {
                provider: ProviderId::OpenRouter,
                status: 503
            }
            .is_retryable()
        );
        assert!(GatewayError::MissingCredential(ProviderId::OpenAi).is_retryable());
        assert!(
            !GatewayError::Malformed {
                provider: ProviderId::Anthropic,
                reason: "truncated".to_string()
            }
            .is_retryable()
        );
        assert!(
            !GatewayError::AllProvidersFailed {
                summary: "x".to_string()
            }
            .is_retryable()
        );
    }
}
