//! Infrastructure layer for decision-council
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: LLM provider adapters with failover, the JSON
//! decision store, and configuration file loading.

pub mod config;
pub mod providers;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigLoader, CouncilConfig, ProvidersConfig, RunDefaults, StoreConfig};
pub use providers::{
    ProviderAdapter,
    anthropic::AnthropicAdapter,
    failover::{CooldownRegistry, FailoverGateway},
    openai::OpenAiCompatAdapter,
};
pub use store::{DecisionRecord, JsonDecisionStore};
