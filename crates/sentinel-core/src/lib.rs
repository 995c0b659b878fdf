//! Sentinel Core: smart-contract analysis orchestration
//!
//! - [`dispatcher::AnalysisService`] validates requests and routes them
//! - [`orchestrator::analyze_address`] fans out to four engines and merges
//! - [`ai_fuzz::AiFuzzPipeline`] generates, runs and explains a fuzz test
//! - [`repo_scan::RepoScanner`] audits a repository in rate-limited batches
//!
//! External collaborators are reached through [`Engines`], built once at
//! start-up and shared by every request.

pub mod ai_fuzz;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod engines;
pub mod error;
pub mod fence;
pub mod orchestrator;
pub mod prompts;
pub mod repo_scan;
pub mod telemetry;

pub use ai_fuzz::{AiFuzzPipeline, AiFuzzReport, PipelineStage, TerminalState};
pub use config::{Engines, ScanConfig, SentinelConfig};
pub use dispatcher::AnalysisService;
pub use domain::{
    AddressReport, AnalysisReport, AnalysisRequest, FileAnalysisEntry, FileReport, Finding,
    FuzzOutcome, FuzzStatus, HoneypotVerdict, InputKind, RawAnalysisRequest, RiskLevel, Severity,
    StaticAnalysisResult, SNIPPET_FILE_NAME,
};
pub use error::{AuditError, Result, GENERIC_FAILURE_MESSAGE};
pub use orchestrator::analyze_address;
pub use repo_scan::{RepoScanner, ScanOutcome, ScanStats, ScanWorkspace, SourceWalker};
pub use telemetry::init_tracing;

/// Crate version, reported by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
