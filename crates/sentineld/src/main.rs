//! sentineld - HTTP front end for Contract Sentinel
//!
//! Exposes `POST /api/analyze` and `GET /health`. Configuration comes from
//! the environment (optionally a `.env` file) and the flags below.

mod app;

use anyhow::{Context, Result};
use clap::Parser;
use sentinel_core::{init_tracing, AnalysisService, Engines, SentinelConfig};
use tokio::net::TcpListener;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "sentineld")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Smart-contract analysis service", long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, env = "SENTINEL_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Emit JSON-formatted log lines
    #[arg(long, env = "SENTINEL_LOG_JSON")]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(args.json, level);

    let config = SentinelConfig::from_env();
    info!(
        harness = %config.harness.workspace.display(),
        scan_root = %config.scan.workspace_root.display(),
        model = %config.llm.model,
        "configuration loaded"
    );
    let engines = Engines::from_config(config).context("failed to build upstream clients")?;
    let app = app::router(AnalysisService::new(engines));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("sentineld listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("sentineld stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
