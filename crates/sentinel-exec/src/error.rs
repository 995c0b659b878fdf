//! Error types for sentinel-exec

use thiserror::Error;

/// Errors raised while launching or awaiting an external process.
///
/// A process that runs and exits non-zero is *not* an error at this layer;
/// callers inspect [`crate::ProcessOutput::exit_code`] themselves.
#[derive(Error, Debug)]
pub enum ExecError {
    /// Spec had an empty program name
    #[error("process spec has an empty program")]
    EmptyCommand,

    /// The executable could not be started
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process outlived its configured timeout
    #[error("{program} timed out after {timeout_secs} seconds")]
    Timeout { program: String, timeout_secs: u64 },

    /// IO error while collecting output
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for process execution
pub type Result<T> = std::result::Result<T, ExecError>;
