//! Run batch use case
//!
//! Runs the workflow over many decisions. The bulk cap is enforced before
//! any work starts; past that point each decision runs independently and a
//! failure is recorded per decision instead of aborting the batch.

use crate::config::RunOptions;
use crate::ports::decision_store::DecisionStore;
use crate::ports::observer::WorkflowObserver;
use crate::ports::provider_gateway::ProviderGateway;
use crate::use_cases::run_workflow::{RunWorkflowUseCase, WorkflowError};
use council_domain::GateDecision;
use std::sync::Arc;
use tracing::{info, warn};

/// Per-decision result of a batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    pub decision_id: String,
    /// Gate decision, or the failure that prevented one.
    pub outcome: Result<GateDecision, String>,
}

/// Use case for running the workflow over a set of decisions
pub struct RunBatchUseCase<G: ProviderGateway + 'static, S: DecisionStore> {
    workflow: Arc<RunWorkflowUseCase<G, S>>,
    store: Arc<S>,
}

impl<G: ProviderGateway + 'static, S: DecisionStore> RunBatchUseCase<G, S> {
    pub fn new(workflow: Arc<RunWorkflowUseCase<G, S>>, store: Arc<S>) -> Self {
        Self { workflow, store }
    }

    /// Run every decision in `ids`, or every Proposed decision when `ids`
    /// is `None`. Fails up front when the set exceeds the bulk cap.
    pub async fn execute(
        &self,
        ids: Option<Vec<String>>,
        options: &RunOptions,
        observer: Arc<dyn WorkflowObserver>,
    ) -> Result<Vec<BatchOutcome>, WorkflowError> {
        let ids = match ids {
            Some(ids) => ids,
            None => self.store.list_proposed().await?,
        };
        if ids.len() > options.bulk_cap {
            return Err(WorkflowError::BulkCapExceeded {
                count: ids.len(),
                cap: options.bulk_cap,
            });
        }
        info!(count = ids.len(), "starting batch run");

        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = match self
                .workflow
                .execute(&id, options, Arc::clone(&observer))
                .await
            {
                Ok(state) => Ok(state.gate.unwrap_or(GateDecision::Challenged)),
                Err(e) => {
                    warn!(decision = %id, error = %e, "batch entry failed");
                    Err(e.to_string())
                }
            };
            outcomes.push(BatchOutcome {
                decision_id: id,
                outcome,
            });
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::decision_store::{StoreError, StoredDecision};
    use crate::ports::observer::NoObserver;
    use crate::ports::provider_gateway::{CompletionRequest, GatewayError};
    use async_trait::async_trait;
    use council_domain::{PrdArtifact, ReviewOutput, Synthesis, WorkflowState, WorkflowStatus};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Gateway that counts calls so tests can assert no provider was touched.
    struct CountingGateway {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProviderGateway for CountingGateway {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::AllProvidersFailed {
                summary: "test gateway".to_string(),
            })
        }
    }

    /// Store with a fixed proposed list and a write counter.
    struct StubStore {
        proposed: Vec<String>,
        writes: AtomicUsize,
    }

    impl StubStore {
        fn with_proposed(count: usize) -> Self {
            Self {
                proposed: (0..count).map(|i| format!("d-{i}")).collect(),
                writes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DecisionStore for StubStore {
        async fn get(&self, decision_id: &str) -> Result<StoredDecision, StoreError> {
            Err(StoreError::NotFound(decision_id.to_string()))
        }

        async fn list_proposed(&self) -> Result<Vec<String>, StoreError> {
            Ok(self.proposed.clone())
        }

        async fn update_status(
            &self,
            _decision_id: &str,
            _status: WorkflowStatus,
        ) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn upsert_review(
            &self,
            _decision_id: &str,
            _review: &ReviewOutput,
        ) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn upsert_synthesis(
            &self,
            _decision_id: &str,
            _synthesis: &Synthesis,
        ) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn upsert_prd(
            &self,
            _decision_id: &str,
            _prd: &PrdArtifact,
        ) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn upsert_governance_checks(
            &self,
            _decision_id: &str,
            _checks: &BTreeMap<String, bool>,
        ) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn record_run(&self, _state: &WorkflowState) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn batch(store: Arc<StubStore>, gateway: Arc<CountingGateway>) -> RunBatchUseCase<CountingGateway, StubStore> {
        let workflow = Arc::new(RunWorkflowUseCase::new(gateway, Arc::clone(&store)));
        RunBatchUseCase::new(workflow, store)
    }

    #[tokio::test]
    async fn test_over_cap_rejected_before_any_work() {
        let store = Arc::new(StubStore::with_proposed(51));
        let gateway = Arc::new(CountingGateway {
            calls: AtomicUsize::new(0),
        });
        let use_case = batch(Arc::clone(&store), Arc::clone(&gateway));

        let options = RunOptions::default().with_bulk_cap(50);
        let err = use_case
            .execute(None, &options, Arc::new(NoObserver))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::BulkCapExceeded { count: 51, cap: 50 }
        ));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_entry_failure_does_not_abort_siblings() {
        let store = Arc::new(StubStore::with_proposed(0));
        let gateway = Arc::new(CountingGateway {
            calls: AtomicUsize::new(0),
        });
        let use_case = batch(store, gateway);

        let ids = Some(vec!["a".to_string(), "b".to_string()]);
        let outcomes = use_case
            .execute(ids, &RunOptions::default(), Arc::new(NoObserver))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.outcome.is_err()));
        assert_eq!(outcomes[1].decision_id, "b");
    }
}
