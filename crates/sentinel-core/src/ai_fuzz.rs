//! AI-driven fuzzing pipeline
//!
//! A four-stage state machine:
//!
//! ```text
//! FetchAbi -> GenerateTest -> ExecuteTest -> Passed | Incompatible
//!                                        \-> Interpret -> FailedInterpreted
//! ```
//!
//! Any stage error ends in `Unavailable { stage }`, reported to the caller as
//! an `incompatible` outcome. [`AiFuzzPipeline::run`] never returns an error.

use crate::config::Engines;
use crate::domain::FuzzOutcome;
use crate::engines::generic_fuzz::{classify_harness_output, HarnessVerdict};
use crate::error::{AuditError, Result};
use crate::fence::extract_first_code_block;
use crate::prompts::{failure_interpretation_prompt, test_generation_prompt};
use sentinel_exec::HarnessJob;
use sentinel_upstream::{PromptRequest, PromptRole};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

pub const PASSED_REASON: &str = "AI-generated fuzz test passed against the contract.";
pub const INCOMPATIBLE_REASON: &str = "AI-generated test suite was not compatible with this contract.";
pub const UNAVAILABLE_REASON: &str = "AI-driven fuzzing could not be completed for this contract.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    FetchAbi,
    GenerateTest,
    ExecuteTest,
    Interpret,
}

impl PipelineStage {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::FetchAbi => "fetch_abi",
            PipelineStage::GenerateTest => "generate_test",
            PipelineStage::ExecuteTest => "execute_test",
            PipelineStage::Interpret => "interpret",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the pipeline stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TerminalState {
    Passed,
    Incompatible,
    FailedInterpreted,
    Unavailable { stage: PipelineStage },
}

/// Outcome plus the terminal state that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiFuzzReport {
    pub outcome: FuzzOutcome,
    pub terminal: TerminalState,
}

enum Step {
    FetchAbi,
    GenerateTest { abi: String },
    ExecuteTest { test_source: String },
    Interpret { log: String },
}

impl Step {
    fn stage(&self) -> PipelineStage {
        match self {
            Step::FetchAbi => PipelineStage::FetchAbi,
            Step::GenerateTest { .. } => PipelineStage::GenerateTest,
            Step::ExecuteTest { .. } => PipelineStage::ExecuteTest,
            Step::Interpret { .. } => PipelineStage::Interpret,
        }
    }
}

enum Transition {
    Next(Step),
    Finished(AiFuzzReport),
}

/// Generate, run and explain a model-written fuzz test for one address.
pub struct AiFuzzPipeline {
    engines: Engines,
}

impl AiFuzzPipeline {
    pub fn new(engines: Engines) -> Self {
        Self { engines }
    }

    /// Drive the pipeline to a terminal state.
    ///
    /// `known_abi` (e.g. published alongside verified source) satisfies the
    /// fetch stage without another explorer call.
    #[instrument(skip(self, known_abi), fields(abi_known = known_abi.is_some()))]
    pub async fn run(&self, address: &str, known_abi: Option<String>) -> AiFuzzReport {
        let mut step = match known_abi.filter(|abi| !abi.trim().is_empty()) {
            Some(abi) => Step::GenerateTest { abi },
            None => Step::FetchAbi,
        };

        let report = loop {
            let stage = step.stage();
            debug!(stage = %stage, "entering stage");

            match self.advance(step, address).await {
                Ok(Transition::Next(next)) => step = next,
                Ok(Transition::Finished(report)) => break report,
                Err(err) => {
                    warn!(stage = %stage, error = %err, "AI fuzz pipeline unavailable");
                    break AiFuzzReport {
                        outcome: FuzzOutcome::incompatible(UNAVAILABLE_REASON),
                        terminal: TerminalState::Unavailable { stage },
                    };
                }
            }
        };

        info!(terminal = ?report.terminal, status = ?report.outcome.status, "AI fuzz pipeline finished");
        report
    }

    async fn advance(&self, step: Step, address: &str) -> Result<Transition> {
        match step {
            Step::FetchAbi => {
                let abi = self.engines.explorer.get_abi(address).await?;
                Ok(Transition::Next(Step::GenerateTest { abi }))
            }
            Step::GenerateTest { abi } => {
                let reply = self
                    .engines
                    .model
                    .complete(PromptRequest::new(
                        PromptRole::TestGeneration,
                        test_generation_prompt(&abi),
                    ))
                    .await?;
                let test_source = extract_first_code_block(&reply).ok_or_else(|| {
                    AuditError::Pipeline {
                        stage: PipelineStage::GenerateTest.name(),
                        reason: "model reply contained no fenced code block".to_string(),
                    }
                })?;
                Ok(Transition::Next(Step::ExecuteTest { test_source }))
            }
            Step::ExecuteTest { test_source } => self.execute(address, &test_source).await,
            Step::Interpret { log } => {
                let interpretation = self
                    .engines
                    .model
                    .complete(PromptRequest::new(
                        PromptRole::FailureInterpretation,
                        failure_interpretation_prompt(&log),
                    ))
                    .await?;
                Ok(Transition::Finished(AiFuzzReport {
                    outcome: FuzzOutcome::failed(interpretation.trim()),
                    terminal: TerminalState::FailedInterpreted,
                }))
            }
        }
    }

    async fn execute(&self, address: &str, test_source: &str) -> Result<Transition> {
        let harness = &self.engines.config.harness;
        let test_file = harness.ai_test_file();

        // The generated test lives at a fixed path; one run at a time. It is
        // removed before the lock is released.
        let _guard = self.engines.harness_lock.lock().await;

        let result = self.run_generated_test(address, &test_file, test_source).await;
        remove_generated_test(&test_file).await;
        result
    }

    async fn run_generated_test(
        &self,
        address: &str,
        test_file: &Path,
        test_source: &str,
    ) -> Result<Transition> {
        let harness = &self.engines.config.harness;

        if let Some(dir) = test_file.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(test_file, test_source).await?;
        debug!(path = %test_file.display(), "generated test persisted");

        let output = self
            .engines
            .runner
            .run(&harness.spec_for(HarnessJob::AiFuzz, address))
            .await
            .map_err(|e| AuditError::Pipeline {
                stage: PipelineStage::ExecuteTest.name(),
                reason: e.to_string(),
            })?;

        Ok(match classify_harness_output(harness, &output) {
            HarnessVerdict::Passed => Transition::Finished(AiFuzzReport {
                outcome: FuzzOutcome::passed(PASSED_REASON),
                terminal: TerminalState::Passed,
            }),
            HarnessVerdict::Incompatible => Transition::Finished(AiFuzzReport {
                outcome: FuzzOutcome::incompatible(INCOMPATIBLE_REASON),
                terminal: TerminalState::Incompatible,
            }),
            HarnessVerdict::Failed(log) => Transition::Next(Step::Interpret { log }),
        })
    }
}

/// Delete the generated test so the next harness build never sees it.
async fn remove_generated_test(test_file: &Path) {
    match tokio::fs::remove_file(test_file).await {
        Ok(()) => debug!(path = %test_file.display(), "generated test removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %test_file.display(), error = %e, "failed to remove generated test"),
    }
}
