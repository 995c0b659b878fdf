//! Command lines for the external fuzz harness, honeypot simulator and git.

use crate::runner::ProcessSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Harness job kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HarnessJob {
    /// Pre-authored invariant suite against the target.
    GenericFuzz,

    /// The model-generated `AIGeneratedFuzzer` test only.
    AiFuzz,

    /// Deposit-then-withdraw honeypot simulation on a forked network.
    HoneypotSimulation,
}

impl HarnessJob {
    /// Stable name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            HarnessJob::GenericFuzz => "generic_fuzz",
            HarnessJob::AiFuzz => "ai_fuzz",
            HarnessJob::HoneypotSimulation => "honeypot_simulation",
        }
    }
}

impl std::fmt::Display for HarnessJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// External harness configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessConfig {
    /// Fuzz-harness project directory (contains `test/`)
    pub workspace: PathBuf,
    /// Fuzz-harness executable
    pub fuzz_program: String,
    /// Contract name of the pre-authored invariant suite
    pub generic_suite: String,
    /// Randomized runs per fuzz property
    pub fuzz_runs: u32,
    /// Path, relative to `workspace`, of the generated test artifact
    pub ai_test_path: PathBuf,
    /// Interpreter for the honeypot simulator
    pub honeypot_program: String,
    /// Honeypot simulator script
    pub honeypot_script: PathBuf,
    /// Network endpoint used for forking
    pub rpc_url: String,
    /// Substring marking a compilation failure in harness output
    pub compiler_error_marker: String,
    /// Per-process timeout in seconds (0 = none)
    pub timeout_secs: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            workspace: env_or("FUZZ_HARNESS_DIR", "fuzz-harness").into(),
            fuzz_program: env_or("FORGE_BIN", "forge"),
            generic_suite: env_or("GENERIC_FUZZ_SUITE", "GenericInvariants"),
            fuzz_runs: env_parse("FUZZ_RUNS", 256),
            ai_test_path: PathBuf::from("test").join(format!("{AI_TEST_CONTRACT}.t.sol")),
            honeypot_program: env_or("HONEYPOT_BIN", "node"),
            honeypot_script: env_or("HONEYPOT_SCRIPT", "honeypot/simulate.js").into(),
            rpc_url: env_or("RPC_URL", "http://127.0.0.1:8545"),
            compiler_error_marker: env_or("COMPILER_ERROR_MARKER", "Compiler run failed"),
            timeout_secs: env_parse("PROCESS_TIMEOUT_SECS", 0),
        }
    }
}

/// Contract name the test-generation prompt asks for.
pub const AI_TEST_CONTRACT: &str = "AIGeneratedFuzzer";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl HarnessConfig {
    /// Create a config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Point the harness at a specific project directory
    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = workspace.into();
        self
    }

    /// Absolute-or-relative path where the generated test is persisted.
    pub fn ai_test_file(&self) -> PathBuf {
        self.workspace.join(&self.ai_test_path)
    }

    /// Whether harness output indicates the suite never compiled.
    pub fn is_compiler_error(&self, output: &str) -> bool {
        !self.compiler_error_marker.is_empty() && output.contains(&self.compiler_error_marker)
    }

    /// Build the process spec for `job` against `address`.
    pub fn spec_for(&self, job: HarnessJob, address: &str) -> ProcessSpec {
        match job {
            HarnessJob::GenericFuzz => self
                .fuzz_base(address)
                .args(["--match-contract", self.generic_suite.as_str()])
                .args(["--fuzz-runs".to_string(), self.fuzz_runs.to_string()]),
            HarnessJob::AiFuzz => self
                .fuzz_base(address)
                .arg("--match-path")
                .arg(self.ai_test_path.to_string_lossy()),
            HarnessJob::HoneypotSimulation => ProcessSpec::new(&self.honeypot_program)
                .arg(self.honeypot_script.to_string_lossy())
                .arg(&self.rpc_url)
                .arg(address)
                .timeout_secs(self.timeout_secs),
        }
    }

    fn fuzz_base(&self, address: &str) -> ProcessSpec {
        let mut spec = ProcessSpec::new(&self.fuzz_program)
            .arg("test")
            .current_dir(&self.workspace)
            .env("TARGET_ADDRESS", address)
            .timeout_secs(self.timeout_secs);
        if !self.rpc_url.is_empty() {
            spec = spec.env("ETH_RPC_URL", &self.rpc_url);
        }
        spec
    }
}

/// `git clone --depth 1 -- <url> <dest>`
///
/// `--` ends option parsing, so a URL starting with `-` stays positional.
pub fn shallow_clone(url: &str, dest: &Path) -> ProcessSpec {
    ProcessSpec::new("git")
        .args(["clone", "--depth", "1", "--", url])
        .arg(dest.to_string_lossy())
}
