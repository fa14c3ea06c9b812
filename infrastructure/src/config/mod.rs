//! Configuration file loading with multi-source merging

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the council
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CouncilConfig {
    pub providers: ProvidersConfig,
    pub run: RunDefaults,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    /// Seconds a failed provider is deprioritized before being retried
    pub cooldown_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            openai_api_key: None,
            openrouter_api_key: None,
            cooldown_secs: 20,
        }
    }
}

impl ProvidersConfig {
    /// Config-file key first, environment variable as fallback.
    pub fn anthropic_key(&self) -> Option<String> {
        self.anthropic_api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn openai_key(&self) -> Option<String> {
        self.openai_api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn openrouter_key(&self) -> Option<String> {
        self.openrouter_api_key
            .clone()
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Defaults for run options, overridable per invocation from the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDefaults {
    pub rounds: u8,
    pub research: bool,
    pub red_team: bool,
    pub chairperson_model: String,
    pub bulk_cap: usize,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            rounds: 1,
            research: false,
            red_team: false,
            chairperson_model: "claude-sonnet-4-5".to_string(),
            bulk_cap: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./decisions"),
        }
    }
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. `COUNCIL_`-prefixed environment variables (`__` as separator,
    ///    e.g. `COUNCIL_RUN__ROUNDS=2`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./council.toml` or `./.council.toml`
    /// 4. Default values
    pub fn load(config_path: Option<&Path>) -> Result<CouncilConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(CouncilConfig::default()));

        for filename in ["council.toml", ".council.toml"] {
            let path = PathBuf::from(filename);
            if path.exists() {
                figment = figment.merge(Toml::file(&path));
                break;
            }
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("COUNCIL_").split("__"));
        figment.extract().map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> CouncilConfig {
        CouncilConfig::default()
    }
}
