//! Workflow observer port
//!
//! Progress callbacks for long-running panel reviews. The CLI renders
//! these to the terminal; library callers use [`NoObserver`].

/// Observer for workflow progress
pub trait WorkflowObserver: Send + Sync {
    /// A lifecycle stage started (e.g. "reviews", "synthesis", "gate").
    fn on_stage(&self, decision_id: &str, stage: &str) {
        let _ = (decision_id, stage);
    }

    /// An agent's review request was dispatched.
    fn on_agent_start(&self, agent_id: &str) {
        let _ = agent_id;
    }

    /// An agent's review came back and was normalized.
    fn on_agent_finish(&self, agent_id: &str, score: i64, blocked: bool) {
        let _ = (agent_id, score, blocked);
    }

    /// An agent's review could not be obtained; a placeholder stands in.
    fn on_agent_failed(&self, agent_id: &str, reason: &str) {
        let _ = (agent_id, reason);
    }
}

/// No-op observer
pub struct NoObserver;

impl WorkflowObserver for NoObserver {}
