//! Honeypot simulation adapter.
//!
//! The simulator deposits into the target on a forked network, tries to
//! withdraw, and prints a JSON verdict on stdout.

use crate::domain::HoneypotVerdict;
use crate::error::{AuditError, Result};
use sentinel_exec::{HarnessConfig, HarnessJob, ProcessRunner};
use tracing::{info, instrument};

const ENGINE: &str = "honeypot";

#[instrument(skip(runner, harness))]
pub async fn simulate(
    runner: &dyn ProcessRunner,
    harness: &HarnessConfig,
    address: &str,
) -> Result<HoneypotVerdict> {
    let spec = harness.spec_for(HarnessJob::HoneypotSimulation, address);
    let output = runner
        .run(&spec)
        .await
        .map_err(|e| AuditError::engine(ENGINE, e.to_string()))?;

    if !output.success() {
        return Err(AuditError::engine(
            ENGINE,
            format!("simulator exited with {}: {}", output.exit_code, output.stderr.trim()),
        ));
    }

    let verdict = parse_verdict(&output.stdout)?;
    info!(is_honeypot = verdict.is_honeypot, "honeypot simulation finished");
    Ok(verdict)
}

/// Parse simulator stdout. Log lines may precede the verdict; the last line
/// that parses wins.
pub fn parse_verdict(stdout: &str) -> Result<HoneypotVerdict> {
    if let Ok(verdict) = serde_json::from_str(stdout.trim()) {
        return Ok(verdict);
    }

    stdout
        .lines()
        .rev()
        .find_map(|line| serde_json::from_str(line.trim()).ok())
        .ok_or_else(|| AuditError::engine(ENGINE, "simulator printed no verdict"))
}
