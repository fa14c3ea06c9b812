//! Command-line argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "decision-council",
    version,
    about = "Panel-of-experts review workflow for strategic decisions"
)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a config file (default: ./council.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Decision data directory (overrides config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the review workflow for a decision, or for all proposed ones
    Run {
        /// Decision id to run
        decision_id: Option<String>,

        /// Run every decision still in the proposed stage
        #[arg(long, conflicts_with = "decision_id")]
        all: bool,

        /// Peer-critique rounds after the initial reviews
        #[arg(long)]
        rounds: Option<u8>,

        /// Override the model for every agent
        #[arg(long)]
        model: Option<String>,

        /// Enrich reviewer prompts with external research
        #[arg(long)]
        research: bool,

        /// Add the red-team personas to the panel
        #[arg(long)]
        red_team: bool,

        /// Override the sampling temperature for every agent
        #[arg(long)]
        temperature: Option<f64>,

        /// Override the token budget for every agent
        #[arg(long)]
        max_tokens: Option<u32>,
    },

    /// Show the persisted result of a decision's last run
    Show {
        decision_id: String,

        /// Emit the raw run record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Seed a decision record from a markdown file
    Init {
        decision_id: String,

        /// Human-readable decision name
        #[arg(long)]
        name: String,

        /// Markdown file with the decision narrative
        #[arg(long)]
        file: PathBuf,
    },
}
