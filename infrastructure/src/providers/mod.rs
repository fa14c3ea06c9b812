//! Provider adapters
//!
//! One adapter per upstream LLM API. Adapters are wrapped by the
//! [`failover::FailoverGateway`], which implements the application's
//! `ProviderGateway` port and walks the provider chain on retryable
//! failures.

pub mod anthropic;
pub mod failover;
pub mod openai;

use council_application::ports::provider_gateway::{CompletionRequest, GatewayError};
use council_domain::ProviderId;
use async_trait::async_trait;

/// A single upstream provider
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Whether a credential for this provider is configured at all.
    /// Checked before any request so an unconfigured provider costs nothing.
    fn has_credential(&self) -> bool;

    /// Map the requested model onto a name this provider serves.
    fn resolve_model(&self, requested: &str) -> String;

    /// Complete the request, returning the raw text of the model's reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;
}

/// Map a transport-level reqwest failure onto the gateway error taxonomy.
pub(crate) fn classify_transport(provider: ProviderId, error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout(provider)
    } else {
        GatewayError::Connection {
            provider,
            reason: error.to_string(),
        }
    }
}
