// Binary crate: anyhow error handling and console output are fine here.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod wiring;

use commands::{enrich, replay_eval, serve, session, worker};

/// BridgeScout — LinkedIn-seed identity resolution.
///
/// The engine resolves a candidate seed (slug + public SERP fields) into
/// ranked platform identities with bridge tiers. Configuration comes from
/// the environment: DATABASE_URL, QUEUE_URL, SERPER_API_KEY, BRAVE_API_KEY,
/// GITHUB_TOKEN, WORKER_CONCURRENCY, BRIDGESCOUT_* thresholds, and
/// BRIDGESCOUT_REPLAY_FIXTURES for replay mode.
#[derive(Parser)]
#[command(name = "bridgescout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Identity-resolution engine: API server, workers, and evaluation tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API and run the worker pool in one process
    Serve(serve::ServeArgs),

    /// Run the worker pool only (health endpoint included)
    Worker(worker::WorkerArgs),

    /// Enqueue an enrichment run for one candidate
    Enrich(enrich::EnrichArgs),

    /// Fetch a session record as JSON
    Session(session::SessionArgs),

    /// Run the golden replay dataset and apply the CI gates
    ReplayEval(replay_eval::ReplayEvalArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Worker(args) => worker::run(args).await,
        Commands::Enrich(args) => enrich::run(args).await,
        Commands::Session(args) => session::run(args).await,
        Commands::ReplayEval(args) => replay_eval::run(args).await,
    }
}
