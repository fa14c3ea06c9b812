//! Directory-backed JSON decision store
//!
//! One directory per decision under the data root:
//!
//! ```text
//! <root>/<decision-id>/decision.json     the decision record
//! <root>/<decision-id>/reviews.json      agent id -> latest review
//! <root>/<decision-id>/synthesis.json
//! <root>/<decision-id>/prd.json
//! <root>/<decision-id>/governance.json
//! <root>/<decision-id>/run.json          full workflow state of the last run
//! ```
//!
//! Writes go through a temp file and rename, so a crashed run leaves the
//! previous artifact intact instead of a half-written file.

use council_application::ports::decision_store::{DecisionStore, StoreError, StoredDecision};
use council_domain::{
    DecisionSnapshot, PrdArtifact, ReviewOutput, Synthesis, WorkflowState, WorkflowStatus,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The persisted decision record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: String,
    pub name: String,
    pub status: WorkflowStatus,
    pub snapshot: DecisionSnapshot,
}

pub struct JsonDecisionStore {
    root: PathBuf,
}

impl JsonDecisionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn decision_dir(&self, decision_id: &str) -> PathBuf {
        self.root.join(decision_id)
    }

    /// Create or replace a decision record. Used for seeding; runs go
    /// through the [`DecisionStore`] trait.
    pub async fn put_decision(&self, record: &DecisionRecord) -> Result<(), StoreError> {
        write_json(&self.decision_dir(&record.id).join("decision.json"), record).await
    }

    /// Load the full workflow state persisted by the most recent run.
    pub async fn last_run(&self, decision_id: &str) -> Result<WorkflowState, StoreError> {
        let path = self.decision_dir(decision_id).join("run.json");
        if !path.exists() {
            return Err(StoreError::NotFound(decision_id.to_string()));
        }
        read_json(&path).await
    }

    async fn read_record(&self, decision_id: &str) -> Result<DecisionRecord, StoreError> {
        let path = self.decision_dir(decision_id).join("decision.json");
        if !path.exists() {
            return Err(StoreError::NotFound(decision_id.to_string()));
        }
        read_json(&path).await
    }
}

#[async_trait]
impl DecisionStore for JsonDecisionStore {
    async fn get(&self, decision_id: &str) -> Result<StoredDecision, StoreError> {
        let record = self.read_record(decision_id).await?;
        Ok(StoredDecision {
            id: record.id,
            name: record.name,
            snapshot: record.snapshot,
            status: record.status,
        })
    }

    async fn list_proposed(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?
        {
            let path = entry.path().join("decision.json");
            if !path.exists() {
                continue;
            }
            let record: DecisionRecord = read_json(&path).await?;
            if record.status == WorkflowStatus::Proposed {
                ids.push(record.id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn update_status(
        &self,
        decision_id: &str,
        status: WorkflowStatus,
    ) -> Result<(), StoreError> {
        let mut record = self.read_record(decision_id).await?;
        record.status = status;
        debug!(decision = %decision_id, status = %status, "status updated");
        self.put_decision(&record).await
    }

    async fn upsert_review(
        &self,
        decision_id: &str,
        review: &ReviewOutput,
    ) -> Result<(), StoreError> {
        let path = self.decision_dir(decision_id).join("reviews.json");
        let mut reviews: BTreeMap<String, ReviewOutput> = if path.exists() {
            read_json(&path).await?
        } else {
            BTreeMap::new()
        };
        reviews.insert(review.agent_id.clone(), review.clone());
        write_json(&path, &reviews).await
    }

    async fn upsert_synthesis(
        &self,
        decision_id: &str,
        synthesis: &Synthesis,
    ) -> Result<(), StoreError> {
        write_json(
            &self.decision_dir(decision_id).join("synthesis.json"),
            synthesis,
        )
        .await
    }

    async fn upsert_prd(&self, decision_id: &str, prd: &PrdArtifact) -> Result<(), StoreError> {
        write_json(&self.decision_dir(decision_id).join("prd.json"), prd).await
    }

    async fn upsert_governance_checks(
        &self,
        decision_id: &str,
        checks: &BTreeMap<String, bool>,
    ) -> Result<(), StoreError> {
        write_json(&self.decision_dir(decision_id).join("governance.json"), checks).await
    }

    async fn record_run(&self, state: &WorkflowState) -> Result<(), StoreError> {
        write_json(&self.decision_dir(&state.decision_id).join("run.json"), state).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
    }
    let json = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json)
        .await
        .map_err(|e| StoreError::Io(format!("{}: {e}", tmp.display())))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))
}
