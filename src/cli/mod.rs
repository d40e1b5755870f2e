pub mod evaluate;
pub mod schema;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quanta-ftt")]
#[command(
    author,
    version,
    about = "Grade free-form solutions with self-consistency voting over LLM calls"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Grade one candidate solution and print the feedback record
    Evaluate(EvaluateArgs),

    /// Print JSON Schema for config validation
    Schema,
}

#[derive(Parser, Clone)]
pub struct EvaluateArgs {
    /// Path to config file
    #[arg(short, long, default_value = "quanta-ftt.yaml")]
    pub config: PathBuf,

    /// Problem file (YAML: statement, solutions, optional requirements)
    #[arg(short, long)]
    pub problem: PathBuf,

    /// File containing the candidate solution
    #[arg(short, long, conflicts_with = "solution_text", required_unless_present = "solution_text")]
    pub solution: Option<PathBuf>,

    /// Candidate solution given inline
    #[arg(long)]
    pub solution_text: Option<String>,

    /// Also write a JSON + Markdown report into this directory
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Override the number of votes per voting stage
    #[arg(long)]
    pub reruns: Option<usize>,

    /// Grade validity only
    #[arg(long)]
    pub no_quality: bool,

    /// Keep answer hints in B/E/F validity feedback
    #[arg(long)]
    pub keep_hints: bool,
}
