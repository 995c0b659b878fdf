//! Sentinel Exec - external process capability
//!
//! Every engine that shells out (fuzz harness, honeypot simulator, git) goes
//! through the narrow [`ProcessRunner`] trait:
//! - [`TokioProcessRunner`] spawns real processes
//! - [`fakes::FakeProcessRunner`] scripts outputs for tests
//! - [`harness`] builds the concrete command lines from [`HarnessConfig`]

pub mod error;
pub mod fakes;
pub mod harness;
pub mod runner;

// Re-export key types
pub use error::{ExecError, Result};
pub use harness::{shallow_clone, HarnessConfig, HarnessJob, AI_TEST_CONTRACT};
pub use runner::{ProcessOutput, ProcessRunner, ProcessSpec, TokioProcessRunner};
