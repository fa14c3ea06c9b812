//! Application layer for decision-council
//!
//! This crate contains use cases, port definitions, and application
//! configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::RunOptions;
pub use ports::{
    decision_store::{DecisionStore, StoreError, StoredDecision},
    observer::{NoObserver, WorkflowObserver},
    provider_gateway::{CompletionRequest, GatewayError, ProviderGateway},
    research::{
        AncestryRequest, AncestryResult, AncestryRetriever, OutcomeBand, ResearchDigest,
        ResearchError, ResearchItem, ResearchProvider, ResearchRequest, RetrievalMethod,
        RiskSimulation, RiskSimulator, SimilarDecision, SimulationMode, SimulationOutcomes,
    },
};
pub use use_cases::review_round::ReviewRoundUseCase;
pub use use_cases::run_batch::{BatchOutcome, RunBatchUseCase};
pub use use_cases::run_workflow::{RunWorkflowUseCase, WorkflowError, present_sections};
