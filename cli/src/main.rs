//! CLI entrypoint for decision-council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod cli;
mod observer;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Command};
use colored::Colorize;
use council_application::{
    NoObserver, RunBatchUseCase, RunOptions, RunWorkflowUseCase, WorkflowObserver,
    present_sections,
};
use council_domain::{DecisionSnapshot, GateDecision, WorkflowState, WorkflowStatus, open_questions};
use council_infrastructure::{
    AnthropicAdapter, ConfigLoader, CouncilConfig, DecisionRecord, FailoverGateway,
    JsonDecisionStore, OpenAiCompatAdapter, ProviderAdapter,
};
use observer::ConsoleObserver;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to load configuration: {e}"))?;

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.store.data_dir.clone());
    let store = Arc::new(JsonDecisionStore::new(&data_dir));
    info!(data_dir = %data_dir.display(), "using decision store");

    match cli.command {
        Command::Init {
            decision_id,
            name,
            file,
        } => {
            let body = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            // Tick a section checkbox for every heading the document carries
            let checks = present_sections(&body);
            let record = DecisionRecord {
                id: decision_id.clone(),
                name,
                status: WorkflowStatus::Proposed,
                snapshot: DecisionSnapshot::new(body).with_governance_checks(checks),
            };
            store.put_decision(&record).await?;
            println!("Seeded decision {} in {}", decision_id, data_dir.display());
        }

        Command::Show { decision_id, json } => {
            let state = store.last_run(&decision_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print_summary(&state);
            }
        }

        Command::Run {
            decision_id,
            all,
            rounds,
            model,
            research,
            red_team,
            temperature,
            max_tokens,
        } => {
            let options = RunOptions::default()
                .with_rounds(rounds.unwrap_or(config.run.rounds))
                .with_research(research || config.run.research)
                .with_red_team(red_team || config.run.red_team)
                .with_model_override(model)
                .with_temperature(temperature)
                .with_max_tokens(max_tokens)
                .with_bulk_cap(config.run.bulk_cap)
                .with_chairperson_model(config.run.chairperson_model.clone());

            // === Dependency Injection ===
            let gateway = Arc::new(build_gateway(&config));
            let workflow = Arc::new(RunWorkflowUseCase::new(gateway, Arc::clone(&store)));
            let observer: Arc<dyn WorkflowObserver> = if cli.quiet {
                Arc::new(NoObserver)
            } else {
                Arc::new(ConsoleObserver)
            };

            if all {
                let batch = RunBatchUseCase::new(workflow, store);
                let outcomes = batch.execute(None, &options, observer).await?;
                println!();
                for outcome in &outcomes {
                    match &outcome.outcome {
                        Ok(gate) => {
                            println!("{}  {}", outcome.decision_id, gate_colored(*gate))
                        }
                        Err(reason) => {
                            println!("{}  {}  {}", outcome.decision_id, "FAILED".red(), reason)
                        }
                    }
                }
                return Ok(());
            }

            let Some(decision_id) = decision_id else {
                bail!("A decision id is required unless --all is given.");
            };
            let state = workflow.execute(&decision_id, &options, observer).await?;
            print_summary(&state);
        }
    }

    Ok(())
}

fn build_gateway(config: &CouncilConfig) -> FailoverGateway {
    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![
        Arc::new(AnthropicAdapter::new(config.providers.anthropic_key())),
        Arc::new(OpenAiCompatAdapter::openai(config.providers.openai_key())),
        Arc::new(OpenAiCompatAdapter::openrouter(
            config.providers.openrouter_key(),
        )),
    ];
    FailoverGateway::new(adapters)
        .with_cooldown(Duration::from_secs(config.providers.cooldown_secs))
}

fn gate_colored(gate: GateDecision) -> String {
    match gate {
        GateDecision::Approved => gate.to_string().green().bold().to_string(),
        GateDecision::Challenged => gate.to_string().yellow().bold().to_string(),
        GateDecision::Blocked => gate.to_string().red().bold().to_string(),
    }
}

fn print_summary(state: &WorkflowState) {
    println!();
    println!(
        "{}",
        format!("Decision: {} ({})", state.decision_name, state.decision_id).bold()
    );
    let gate = state
        .gate
        .map(gate_colored)
        .unwrap_or_else(|| "undecided".dimmed().to_string());
    println!(
        "Gate: {}  DQS: {:.2}  Hygiene: {:.1}  Confidence: {:.2}",
        gate, state.dqs, state.hygiene_score, state.confidence_score
    );
    if state.dissent_penalty > 0.0 {
        println!("Dissent penalty: {:.2}", state.dissent_penalty);
    }

    println!();
    for review in state.reviews.values() {
        let verdict = if review.blocked {
            format!("{}/10 BLOCKED", review.score).red().to_string()
        } else {
            format!("{}/10", review.score)
        };
        println!(
            "  {:<12} {}  (confidence {:.2})  {}",
            review.agent_id, verdict, review.confidence, review.thesis
        );
    }

    if let Some(synthesis) = &state.synthesis {
        println!();
        println!("{}", "Synthesis".bold());
        println!("  {}", synthesis.summary);
        for revision in &synthesis.required_revisions {
            println!("  - {}", revision);
        }
    }

    let questions = open_questions(state);
    if !questions.is_empty() {
        println!();
        println!("{}", "Open questions".bold());
        for question in &questions {
            println!("  - {}", question);
        }
    }

    if let Some(prd) = &state.prd {
        println!();
        println!(
            "PRD generated: {} requirements, {} open risks",
            prd.requirements.len(),
            prd.open_risks.len()
        );
    }
}
