//! Anthropic Messages API adapter

use super::{ProviderAdapter, classify_transport};
use council_application::ports::provider_gateway::{CompletionRequest, GatewayError};
use council_domain::ProviderId;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct AnthropicAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("ANTHROPIC_API_KEY").ok())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Claude model names pass through; anything else falls back to the
    /// default Claude model rather than failing the request.
    fn resolve_model(&self, requested: &str) -> String {
        if requested.starts_with("claude") {
            requested.to_string()
        } else {
            DEFAULT_MODEL.to_string()
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let Some(api_key) = &self.api_key else {
            return Err(GatewayError::MissingCredential(self.id()));
        };

        // The messages API has no structured-output switch; prompts carry
        // the JSON contract and the extractor handles the rest.
        let payload = json!({
            "model": self.resolve_model(&request.model),
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "system": request.system,
            "messages": [{"role": "user", "content": request.user}],
        });

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| classify_transport(self.id(), e))?;

        let status = response.status();
        match status.as_u16() {
            429 => return Err(GatewayError::RateLimited(self.id())),
            401 | 403 => return Err(GatewayError::MissingCredential(self.id())),
            s if status.is_server_error() => {
                return Err(GatewayError::Upstream {
                    provider: self.id(),
                    status: s,
                });
            }
            s if !status.is_success() => {
                return Err(GatewayError::Unconfigured {
                    provider: self.id(),
                    reason: format!("request rejected with status {s}"),
                });
            }
            _ => {}
        }

        let body: Value = response.json().await.map_err(|e| GatewayError::Malformed {
            provider: self.id(),
            reason: e.to_string(),
        })?;
        body["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Malformed {
                provider: self.id(),
                reason: "no text content in response".to_string(),
            })
    }
}
