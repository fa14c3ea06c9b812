//! OpenAI-compatible chat-completions adapter
//!
//! Serves both OpenAI proper and OpenRouter, which speaks the same wire
//! format under a different base URL and model namespace.

use super::{ProviderAdapter, classify_transport};
use council_application::ports::provider_gateway::{CompletionRequest, GatewayError};
use council_domain::ProviderId;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OPENAI_FALLBACK_MODEL: &str = "gpt-4o";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAiCompatAdapter {
    id: ProviderId,
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiCompatAdapter {
    pub fn openai(api_key: Option<String>) -> Self {
        Self {
            id: ProviderId::OpenAi,
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn openrouter(api_key: Option<String>) -> Self {
        Self {
            id: ProviderId::OpenRouter,
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: OPENROUTER_BASE_URL.to_string(),
        }
    }

    pub fn openai_from_env() -> Self {
        Self::openai(std::env::var("OPENAI_API_KEY").ok())
    }

    pub fn openrouter_from_env() -> Self {
        Self::openrouter(std::env::var("OPENROUTER_API_KEY").ok())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatAdapter {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// OpenAI cannot serve Claude models, so those map to the fallback.
    /// OpenRouter serves everything under vendor-prefixed names.
    fn resolve_model(&self, requested: &str) -> String {
        match self.id {
            ProviderId::OpenRouter => {
                if requested.contains('/') {
                    requested.to_string()
                } else if requested.starts_with("claude") {
                    format!("anthropic/{requested}")
                } else if requested.starts_with("gpt") || requested.starts_with('o') {
                    format!("openai/{requested}")
                } else {
                    requested.to_string()
                }
            }
            _ => {
                if requested.starts_with("claude") {
                    OPENAI_FALLBACK_MODEL.to_string()
                } else {
                    requested.to_string()
                }
            }
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let Some(api_key) = &self.api_key else {
            return Err(GatewayError::MissingCredential(self.id));
        };

        let mut payload = json!({
            "model": self.resolve_model(&request.model),
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
        });
        if request.structured {
            payload["response_format"] = json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| classify_transport(self.id, e))?;

        let status = response.status();
        match status.as_u16() {
            429 => return Err(GatewayError::RateLimited(self.id)),
            401 | 403 => return Err(GatewayError::MissingCredential(self.id)),
            s if status.is_server_error() => {
                return Err(GatewayError::Upstream {
                    provider: self.id,
                    status: s,
                });
            }
            s if !status.is_success() => {
                return Err(GatewayError::Unconfigured {
                    provider: self.id,
                    reason: format!("request rejected with status {s}"),
                });
            }
            _ => {}
        }

        let body: Value = response.json().await.map_err(|e| GatewayError::Malformed {
            provider: self.id,
            reason: e.to_string(),
        })?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Malformed {
                provider: self.id,
                reason: "no message content in response".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_maps_claude_to_fallback() {
        let adapter = OpenAiCompatAdapter::openai(Some("key".to_string()));
        assert_eq!(adapter.resolve_model("claude-sonnet-4-5"), "gpt-4o");
        assert_eq!(adapter.resolve_model("gpt-4o-mini"), "gpt-4o-mini");
    }

    #[test]
    fn test_openrouter_prefixes_vendor_namespace() {
        let adapter = OpenAiCompatAdapter::openrouter(Some("key".to_string()));
        assert_eq!(
            adapter.resolve_model("claude-sonnet-4-5"),
            "anthropic/claude-sonnet-4-5"
        );
        assert_eq!(adapter.resolve_model("gpt-4o"), "openai/gpt-4o");
        assert_eq!(
            adapter.resolve_model("mistralai/mixtral-8x7b"),
            "mistralai/mixtral-8x7b"
        );
    }
}
