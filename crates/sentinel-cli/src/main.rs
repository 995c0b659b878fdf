//! Contract Sentinel CLI
//!
//! Runs one analysis and prints the resulting report as JSON on stdout.
//!
//! ## Commands
//!
//! - `address`: static, honeypot, generic fuzz and AI fuzz against a deployed contract
//! - `repo`: audit every Solidity file of a git repository
//! - `snippet`: audit a single local source file
//! - `ai-fuzz`: run only the AI fuzz pipeline and show where it stopped

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use sentinel_core::{
    init_tracing, AiFuzzPipeline, AnalysisService, AuditError, Engines, RawAnalysisRequest,
    RepoScanner, SentinelConfig,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{error, Level};

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-engine smart-contract analysis", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "SENTINEL_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a deployed contract by address
    Address {
        /// Contract address (0x...)
        address: String,
    },

    /// Audit every source file in a git repository
    Repo {
        /// Clone URL
        url: String,

        /// Include scan statistics in the output
        #[arg(long)]
        stats: bool,
    },

    /// Audit a local source file as a pasted snippet
    Snippet {
        /// Path to the source file
        file: PathBuf,
    },

    /// Run only the AI fuzz pipeline against an address
    AiFuzz {
        /// Contract address (0x...)
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    init_tracing(cli.json, level);

    let engines = Engines::from_config(SentinelConfig::from_env())
        .context("Failed to build upstream clients")?;

    let output = match cli.command {
        Commands::Address { address } => cmd_request(&engines, "address", &address).await?,
        Commands::Repo { url, stats: false } => cmd_request(&engines, "github", &url).await?,
        Commands::Repo { url, stats: true } => cmd_repo_stats(&engines, &url).await?,
        Commands::Snippet { file } => cmd_snippet(&engines, &file).await?,
        Commands::AiFuzz { address } => cmd_ai_fuzz(&engines, &address).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn cmd_request(engines: &Engines, input_type: &str, input: &str) -> Result<Value> {
    let service = AnalysisService::new(engines.clone());
    let report = service
        .handle(RawAnalysisRequest::new(input_type, input))
        .await
        .map_err(client_facing)?;
    Ok(serde_json::to_value(report)?)
}

async fn cmd_snippet(engines: &Engines, file: &Path) -> Result<Value> {
    let source = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    cmd_request(engines, "text", &source).await
}

async fn cmd_repo_stats(engines: &Engines, url: &str) -> Result<Value> {
    let outcome = RepoScanner::new(engines.clone())
        .scan(url)
        .await
        .map_err(client_facing)?;
    Ok(serde_json::to_value(outcome)?)
}

async fn cmd_ai_fuzz(engines: &Engines, address: &str) -> Result<Value> {
    let report = AiFuzzPipeline::new(engines.clone()).run(address, None).await;
    Ok(serde_json::to_value(report)?)
}

/// Log the full error and surface only the client-safe message.
fn client_facing(err: AuditError) -> anyhow::Error {
    error!(error = %err, "analysis failed");
    anyhow!(err.client_message().to_string())
}
