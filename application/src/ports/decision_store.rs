//! Decision store port
//!
//! The workflow reads a decision record, then writes each artifact back as
//! an independent operation: a failed synthesis write must not lose the
//! reviews already persisted.

use council_domain::{DecisionSnapshot, PrdArtifact, ReviewOutput, Synthesis, WorkflowState, WorkflowStatus};
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Decision not found: {0}")]
    NotFound(String),

    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A decision record as loaded from storage.
#[derive(Debug, Clone)]
pub struct StoredDecision {
    pub id: String,
    pub name: String,
    pub snapshot: DecisionSnapshot,
    pub status: WorkflowStatus,
}

/// Persistence for decisions and the artifacts a run produces
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Load a decision record by id.
    async fn get(&self, decision_id: &str) -> Result<StoredDecision, StoreError>;

    /// Ids of every decision still in the Proposed stage.
    async fn list_proposed(&self) -> Result<Vec<String>, StoreError>;

    async fn update_status(
        &self,
        decision_id: &str,
        status: WorkflowStatus,
    ) -> Result<(), StoreError>;

    async fn upsert_review(
        &self,
        decision_id: &str,
        review: &ReviewOutput,
    ) -> Result<(), StoreError>;

    async fn upsert_synthesis(
        &self,
        decision_id: &str,
        synthesis: &Synthesis,
    ) -> Result<(), StoreError>;

    async fn upsert_prd(&self, decision_id: &str, prd: &PrdArtifact) -> Result<(), StoreError>;

    /// Persist the aggregated governance-check outcomes for a run.
    async fn upsert_governance_checks(
        &self,
        decision_id: &str,
        checks: &BTreeMap<String, bool>,
    ) -> Result<(), StoreError>;

    /// Persist the full run record (scores, gate, open questions).
    async fn record_run(&self, state: &WorkflowState) -> Result<(), StoreError>;
}
