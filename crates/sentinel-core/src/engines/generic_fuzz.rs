//! Pre-authored invariant suite run through the fuzz harness.

use crate::domain::FuzzOutcome;
use crate::error::{AuditError, Result};
use sentinel_exec::{HarnessConfig, HarnessJob, ProcessOutput, ProcessRunner};
use tracing::{info, instrument, warn};

const ENGINE: &str = "generic_fuzz";

pub const PASSED_REASON: &str = "All generic invariants held.";
pub const INCOMPATIBLE_REASON: &str = "Generic test suite was not compatible with this contract.";

/// How a harness run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessVerdict {
    Passed,
    /// Suite never ran against the target (compiler-error marker seen).
    Incompatible,
    /// Genuine failure; carries the combined log.
    Failed(String),
}

/// Classify a finished harness run.
///
/// Exit code zero passes. Otherwise the combined output is searched for the
/// configured compiler-error marker. This is a textual heuristic and only
/// as reliable as the marker.
pub fn classify_harness_output(harness: &HarnessConfig, output: &ProcessOutput) -> HarnessVerdict {
    if output.success() {
        return HarnessVerdict::Passed;
    }

    let log = output.combined();
    if harness.is_compiler_error(&log) {
        HarnessVerdict::Incompatible
    } else {
        HarnessVerdict::Failed(log.trim().to_string())
    }
}

#[instrument(skip(runner, harness))]
pub async fn run_generic_suite(
    runner: &dyn ProcessRunner,
    harness: &HarnessConfig,
    address: &str,
) -> Result<FuzzOutcome> {
    let spec = harness.spec_for(HarnessJob::GenericFuzz, address);
    let output = runner
        .run(&spec)
        .await
        .map_err(|e| AuditError::engine(ENGINE, e.to_string()))?;

    let outcome = match classify_harness_output(harness, &output) {
        HarnessVerdict::Passed => FuzzOutcome::passed(PASSED_REASON),
        HarnessVerdict::Incompatible => {
            warn!(exit_code = output.exit_code, "generic suite did not compile against target");
            FuzzOutcome::incompatible(INCOMPATIBLE_REASON)
        }
        HarnessVerdict::Failed(log) => {
            FuzzOutcome::failed(format!("Generic invariant violated:\n{log}"))
        }
    };

    info!(status = ?outcome.status, duration_ms = output.duration_ms, "generic fuzzing finished");
    Ok(outcome)
}
