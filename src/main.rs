use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod config;
mod error;
mod output;
mod parser;
mod pipeline;
mod problem;
mod provider;
mod stages;
mod vote;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing - only show logs with --verbose
    let filter = if cli.verbose {
        EnvFilter::new("quanta_ftt=debug")
    } else {
        EnvFilter::new("quanta_ftt=warn")
    };

    // stdout carries the feedback record
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Evaluate(args) => cli::evaluate::execute(args).await,
        Commands::Schema => cli::schema::execute(),
    }
}
