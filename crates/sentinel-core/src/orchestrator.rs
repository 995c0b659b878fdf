//! Address analysis: fetch source, fan out to the four engines, merge.
//!
//! The static, dynamic and generic-fuzz adapters and the AI fuzz pipeline are
//! spawned as independent tokio tasks. All four are awaited before the report
//! is built; a failed or panicked task is replaced by its fallback value and
//! never affects the others.

use crate::ai_fuzz::{AiFuzzPipeline, AiFuzzReport};
use crate::config::Engines;
use crate::domain::{AddressReport, FuzzOutcome, HoneypotVerdict};
use crate::engines::{analyze_source, run_generic_suite, simulate};
use crate::error::{AuditError, Result};
use sentinel_upstream::VerifiedSource;
use tokio::task::JoinError;
use tracing::{error, info, instrument, warn};

pub const HONEYPOT_FALLBACK_REASON: &str = "Honeypot check failed.";
pub const GENERIC_FALLBACK_REASON: &str = "Generic fuzzing failed.";
pub const AI_FALLBACK_REASON: &str = "AI-driven fuzzing process failed to run.";

/// Run every engine against `address` and merge the results.
///
/// Fails only when the explorer has no verified source for the address.
#[instrument(skip(engines))]
pub async fn analyze_address(engines: &Engines, address: &str) -> Result<AddressReport> {
    let VerifiedSource {
        source_code, abi, ..
    } = engines.explorer.get_source_code(address).await.map_err(|e| {
        warn!(error = %e, "no verified source");
        AuditError::UpstreamFetch(format!("no source code found for {address}: {e}"))
    })?;

    let static_task = {
        let model = engines.model.clone();
        tokio::spawn(async move { analyze_source(model.as_ref(), &source_code).await })
    };

    let dynamic_task = {
        let runner = engines.runner.clone();
        let config = engines.config.clone();
        let address = address.to_string();
        tokio::spawn(async move { simulate(runner.as_ref(), &config.harness, &address).await })
    };

    let generic_task = {
        let runner = engines.runner.clone();
        let config = engines.config.clone();
        let address = address.to_string();
        tokio::spawn(
            async move { run_generic_suite(runner.as_ref(), &config.harness, &address).await },
        )
    };

    let ai_task = {
        let pipeline = AiFuzzPipeline::new(engines.clone());
        let address = address.to_string();
        tokio::spawn(async move { pipeline.run(&address, abi).await })
    };

    let (static_result, dynamic_result, generic_result, ai_result) =
        tokio::join!(static_task, dynamic_task, generic_task, ai_task);

    let report = AddressReport {
        static_analysis: settle("static", static_result),
        dynamic_analysis: settle("honeypot", dynamic_result).unwrap_or_else(|| HoneypotVerdict {
            is_honeypot: false,
            reason: HONEYPOT_FALLBACK_REASON.to_string(),
        }),
        generic_fuzzing: settle("generic_fuzz", generic_result)
            .unwrap_or_else(|| FuzzOutcome::incompatible(GENERIC_FALLBACK_REASON)),
        ai_fuzzing: match ai_result {
            Ok(AiFuzzReport { outcome, .. }) => outcome,
            Err(join_err) => {
                error!(engine = "ai_fuzz", error = %join_err, "engine task aborted");
                FuzzOutcome::incompatible(AI_FALLBACK_REASON)
            }
        },
    };

    info!(
        static_ok = report.static_analysis.is_some(),
        honeypot = report.dynamic_analysis.is_honeypot,
        generic = ?report.generic_fuzzing.status,
        ai = ?report.ai_fuzzing.status,
        "address analysis merged"
    );
    Ok(report)
}

/// Collapse a joined engine task into its value, logging why when absent.
fn settle<T>(engine: &'static str, joined: std::result::Result<Result<T>, JoinError>) -> Option<T> {
    match joined {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            warn!(engine, error = %err, "engine failed, using fallback");
            None
        }
        Err(join_err) => {
            error!(engine, error = %join_err, "engine task aborted");
            None
        }
    }
}
