//! Run options
//!
//! Caller-facing knobs for a workflow run. Constructed through the builder
//! so out-of-range values are clamped at the boundary instead of leaking
//! into prompts or provider requests.

const MAX_ROUNDS: u8 = 5;
const DEFAULT_BULK_CAP: usize = 50;
const BULK_CAP_CEILING: usize = 500;

/// Options for a single workflow run (or a batch of runs).
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Peer-critique rounds after the initial reviews (0 disables them).
    pub rounds: u8,
    /// Enrich reviewer prompts with external research.
    pub research: bool,
    /// Add the red-team personas to the core panel.
    pub red_team: bool,
    /// Override every agent's model.
    pub model_override: Option<String>,
    /// Override every agent's sampling temperature.
    pub temperature: Option<f64>,
    /// Override every agent's token budget.
    pub max_tokens: Option<u32>,
    /// Maximum number of decisions a bulk run may touch.
    pub bulk_cap: usize,
    /// Model used for the chairperson synthesis.
    pub chairperson_model: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            rounds: 1,
            research: false,
            red_team: false,
            model_override: None,
            temperature: None,
            max_tokens: None,
            bulk_cap: DEFAULT_BULK_CAP,
            chairperson_model: "claude-sonnet-4-5".to_string(),
        }
    }
}

impl RunOptions {
    pub fn with_rounds(mut self, rounds: u8) -> Self {
        self.rounds = rounds.min(MAX_ROUNDS);
        self
    }

    pub fn with_research(mut self, research: bool) -> Self {
        self.research = research;
        self
    }

    pub fn with_red_team(mut self, red_team: bool) -> Self {
        self.red_team = red_team;
        self
    }

    pub fn with_model_override(mut self, model: Option<String>) -> Self {
        self.model_override = model.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature.map(|t| t.clamp(0.0, 1.0));
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens.map(|t| t.clamp(256, 8000));
        self
    }

    pub fn with_bulk_cap(mut self, cap: usize) -> Self {
        self.bulk_cap = cap.clamp(1, BULK_CAP_CEILING);
        self
    }

    pub fn with_chairperson_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.chairperson_model = model;
        }
        self
    }
}
