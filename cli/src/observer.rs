//! Console progress rendering for workflow runs

use colored::Colorize;
use council_application::WorkflowObserver;

/// Observer that prints progress lines to stderr
pub struct ConsoleObserver;

impl WorkflowObserver for ConsoleObserver {
    fn on_stage(&self, decision_id: &str, stage: &str) {
        eprintln!("{} [{}] {}", "==>".blue().bold(), decision_id, stage);
    }

    fn on_agent_start(&self, agent_id: &str) {
        eprintln!("    {} {} reviewing...", "*".dimmed(), agent_id);
    }

    fn on_agent_finish(&self, agent_id: &str, score: i64, blocked: bool) {
        let verdict = if blocked {
            format!("{score}/10 BLOCKED").red().to_string()
        } else {
            format!("{score}/10").green().to_string()
        };
        eprintln!("    {} {} -> {}", "*".dimmed(), agent_id, verdict);
    }

    fn on_agent_failed(&self, agent_id: &str, reason: &str) {
        eprintln!(
            "    {} {} {}",
            "!".yellow().bold(),
            agent_id,
            reason.dimmed()
        );
    }
}
