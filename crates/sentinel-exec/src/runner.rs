//! Process execution behind a narrow, mockable capability.

use crate::error::{ExecError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// A single process invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// Executable name or path.
    pub program: String,

    /// Arguments, in order.
    pub args: Vec<String>,

    /// Working directory (inherits the caller's when `None`).
    pub working_dir: Option<PathBuf>,

    /// Extra environment variables layered over the inherited environment.
    pub env: BTreeMap<String, String>,

    /// Timeout in seconds (0 = wait indefinitely).
    pub timeout_secs: u64,
}

impl ProcessSpec {
    /// Create a spec for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
            timeout_secs: 0,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run inside `dir`.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Bound the run time (0 disables the bound).
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Program and arguments joined for log lines.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// Exit code (-1 when terminated by a signal).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl ProcessOutput {
    /// Successful exit with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 0,
        }
    }

    /// Failed exit with the given code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 0,
        }
    }

    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout followed by stderr, the way a terminal would interleave them
    /// when both streams are redirected to one file.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, _) => self.stderr.clone(),
            (false, true) => self.stdout.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Capability to run an OS process and capture its output.
///
/// A non-zero exit is returned as `Ok` with the exit code set; only failures
/// to start or await the process are errors.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutput>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutput> {
        let start = Instant::now();

        if spec.program.is_empty() {
            return Err(ExecError::EmptyCommand);
        }

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        debug!(command = %spec.display(), "spawning process");

        let child = command.spawn().map_err(|source| ExecError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let output = if spec.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(spec.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| ExecError::Timeout {
                program: spec.program.clone(),
                timeout_secs: spec.timeout_secs,
            })??
        } else {
            child.wait_with_output().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);

        debug!(command = %spec.display(), exit_code, duration_ms, "process finished");

        Ok(ProcessOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_output_success() {
        assert!(ProcessOutput::ok("done").success());
        assert!(!ProcessOutput::failed(1, "boom").success());
    }

    #[test]
    fn test_combined_output_joins_streams() {
        let out = ProcessOutput {
            exit_code: 1,
            stdout: "Compiling 3 files".to_string(),
            stderr: "Compiler run failed".to_string(),
            duration_ms: 5,
        };
        assert_eq!(out.combined(), "Compiling 3 files\nCompiler run failed");
        assert_eq!(ProcessOutput::failed(1, "only err").combined(), "only err");
        assert_eq!(ProcessOutput::ok("only out").combined(), "only out");
    }

    #[test]
    fn test_spec_builder_and_display() {
        let spec = ProcessSpec::new("forge")
            .args(["test", "--match-contract"])
            .arg("GenericInvariants")
            .env("TARGET_ADDRESS", "0xabc")
            .current_dir("/tmp/harness")
            .timeout_secs(30);

        assert_eq!(spec.display(), "forge test --match-contract GenericInvariants");
        assert_eq!(spec.env.get("TARGET_ADDRESS").map(String::as_str), Some("0xabc"));
        assert_eq!(spec.working_dir, Some(PathBuf::from("/tmp/harness")));
        assert_eq!(spec.timeout_secs, 30);
    }

    #[tokio::test]
    async fn test_execute_simple_command() {
        let spec = ProcessSpec::new("echo").arg("hello");
        let result = TokioProcessRunner::new().run(&spec).await.expect("run failed");
        assert!(result.success());
        assert!(result.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_execute_failing_command() {
        let spec = ProcessSpec::new("false");
        let result = TokioProcessRunner::new().run(&spec).await.expect("run failed");
        assert!(!result.success());
        assert_ne!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn test_env_and_working_dir_reach_child() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ProcessSpec::new("sh")
            .args(["-c", "echo $TARGET_ADDRESS; pwd"])
            .env("TARGET_ADDRESS", "0xfeed")
            .current_dir(dir.path());

        let result = TokioProcessRunner::new().run(&spec).await.unwrap();
        assert!(result.stdout.contains("0xfeed"));
        let name = dir.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(result.stdout.contains(&name));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let spec = ProcessSpec::new("definitely-not-a-real-binary-4f1c");
        let err = TokioProcessRunner::new().run(&spec).await.unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_empty_program_rejected() {
        let err = TokioProcessRunner::new()
            .run(&ProcessSpec::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::EmptyCommand));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let spec = ProcessSpec::new("sleep").arg("5").timeout_secs(1);
        let err = TokioProcessRunner::new().run(&spec).await.unwrap_err();
        assert!(matches!(err, ExecError::Timeout { timeout_secs: 1, .. }));
    }
}
