//! Domain layer for decision-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## The Council
//!
//! A proposed strategic decision is reviewed by a panel of role-specific
//! agents (CEO, CFO, CTO, Compliance, plus optional red-team personas).
//! Each agent produces a structured [`ReviewOutput`]; the panel's verdicts
//! are combined into a Decision Quality Score (DQS) and gated to
//! Approved / Challenged / Blocked.
//!
//! ## Pure stages
//!
//! Hygiene evaluation, scoring, evidence verification, gate rules, and PRD
//! synthesis are all pure functions over [`WorkflowState`]: no I/O, fully
//! reproducible given the same input.

pub mod agent;
pub mod core;
pub mod evidence;
pub mod gate;
pub mod hygiene;
pub mod prd;
pub mod prompt;
pub mod review;
pub mod scoring;
pub mod workflow;

// Re-export commonly used types
pub use agent::profile::{AgentDiscipline, AgentProfile, ProviderId};
pub use core::error::DomainError;
pub use evidence::{AgentEvidence, EvidenceVerification, EvidenceVerdict, verify_evidence};
pub use gate::{decide_gate, apply_synthesis_guardrails};
pub use hygiene::{CheckStatus, HygieneFinding, HygieneReport, evaluate_hygiene};
pub use prd::{PrdArtifact, build_prd, dedupe_exact, dedupe_semantic};
pub use prompt::PromptTemplate;
pub use review::{
    extract::extract_json,
    normalize::{NormalizeError, normalize_review},
    output::{Citation, ReviewOutput, Risk},
};
pub use scoring::{ScoreBreakdown, score_reviews};
pub use workflow::{
    questions::open_questions,
    state::{
        DecisionSnapshot, GateDecision, InteractionRound, RoundEntry, Synthesis, WorkflowState,
        WorkflowStatus,
    },
};
