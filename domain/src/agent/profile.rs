//! Per-agent configuration.
//!
//! [`AgentProfile`] is a static value object: constructed once per run from
//! persisted or caller-supplied configuration, normalized, and never mutated
//! afterwards. The core panel (`ceo`, `cfo`, `cto`, `compliance`) ships with
//! fixed defaults; red-team personas and custom agents are appended per run.

use serde::{Deserialize, Serialize};

/// LLM provider selection for an agent.
///
/// Order of declaration is the fixed global failover priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    #[default]
    Anthropic,
    OpenAi,
    OpenRouter,
}

impl ProviderId {
    /// Fixed global priority order used to build failover attempt lists.
    pub const PRIORITY: [ProviderId; 3] =
        [ProviderId::Anthropic, ProviderId::OpenAi, ProviderId::OpenRouter];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Anthropic => "anthropic",
            ProviderId::OpenAi => "openai",
            ProviderId::OpenRouter => "openrouter",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = std::convert::Infallible;

    /// Unknown names map to the default provider, so stored or
    /// caller-supplied configuration can never fail to load.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "openai" => ProviderId::OpenAi,
            "openrouter" => ProviderId::OpenRouter,
            _ => ProviderId::default(),
        })
    }
}

/// Scoring disposition of an agent role.
///
/// Risk-weighted roles gain weight when they dissent; growth-weighted roles
/// lose a little weight when they cleanly approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentDiscipline {
    RiskWeighted,
    GrowthWeighted,
    Neutral,
}

impl AgentDiscipline {
    /// Infer the discipline from an agent id or role name.
    pub fn infer(id: &str) -> Self {
        let id = id.to_lowercase();
        if id == "cfo" || id == "compliance" {
            return AgentDiscipline::RiskWeighted;
        }
        if id == "ceo" || id == "cto" {
            return AgentDiscipline::GrowthWeighted;
        }
        const RISK_MARKERS: [&str; 5] =
            ["pre-mortem", "premortem", "competitor", "risk", "devil"];
        if RISK_MARKERS.iter().any(|m| id.contains(m)) {
            AgentDiscipline::RiskWeighted
        } else {
            AgentDiscipline::Neutral
        }
    }

    pub fn is_risk_weighted(&self) -> bool {
        matches!(self, AgentDiscipline::RiskWeighted)
    }
}

/// Immutable per-agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Slug, unique within a run
    pub id: String,
    /// Display name of the role
    pub role: String,
    pub provider: ProviderId,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub discipline: AgentDiscipline,
    pub system_prompt: String,
    pub focus: String,
}

impl AgentProfile {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        let id = id.into();
        let discipline = AgentDiscipline::infer(&id);
        Self {
            id,
            role: role.into(),
            provider: ProviderId::default(),
            model: "claude-sonnet-4-5".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            discipline,
            system_prompt: String::new(),
            focus: String::new(),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = focus.into();
        self
    }

    /// Normalize the profile: slugified id, clamped numerics.
    ///
    /// Unknown provider names are already mapped to the default by
    /// `ProviderId::from_str` at the configuration boundary.
    pub fn normalized(mut self) -> Self {
        self.id = slugify(&self.id);
        self.temperature = self.temperature.clamp(0.0, 1.0);
        self.max_tokens = self.max_tokens.clamp(256, 8000);
        self.discipline = AgentDiscipline::infer(&self.id);
        self
    }

    // ==================== Default Panel ====================

    /// The fixed core panel.
    pub fn core_panel() -> Vec<AgentProfile> {
        vec![
            AgentProfile::new("ceo", "Chief Executive Officer").with_focus(
                "strategic fit, market positioning, organizational capacity to execute",
            ),
            AgentProfile::new("cfo", "Chief Financial Officer").with_focus(
                "unit economics, ROI credibility, capital allocation, downside exposure",
            ),
            AgentProfile::new("cto", "Chief Technology Officer").with_focus(
                "technical feasibility, delivery risk, build-vs-buy, operational load",
            ),
            AgentProfile::new("compliance", "Head of Compliance").with_focus(
                "regulatory exposure, contractual obligations, governance completeness",
            ),
        ]
    }

    /// Red-team personas appended when adversarial review is requested.
    pub fn red_team() -> Vec<AgentProfile> {
        vec![
            AgentProfile::new("pre-mortem", "Pre-Mortem Analyst")
                .with_focus("assume the decision failed 18 months out; work backwards to causes"),
            AgentProfile::new("competitor", "Competitor War-Gamer")
                .with_focus("most damaging competitive responses and counter-moves"),
        ]
    }
}

/// Lowercase, alphanumeric-and-hyphen slug.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut last_hyphen = true;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
