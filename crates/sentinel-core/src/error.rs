//! Error taxonomy for the analysis core.

use sentinel_exec::ExecError;
use sentinel_upstream::UpstreamError;

/// Message returned to callers for every failure that is not their fault.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to complete analysis. Please check your input.";

/// Request is missing `inputType` or `input`.
pub const MISSING_INPUT_MESSAGE: &str = "Input type and value are required.";

/// `inputType` is not one of the recognised values.
pub const INVALID_INPUT_TYPE_MESSAGE: &str = "Invalid input type.";

/// Analysis errors.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Malformed or incomplete request. Carries the client-facing message.
    #[error("invalid request: {0}")]
    InputValidation(String),

    /// Required source or ABI unavailable from the explorer.
    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(String),

    /// An upstream reply could not be understood.
    #[error("unparseable upstream response: {0}")]
    UpstreamParse(String),

    /// One analysis engine failed internally.
    #[error("{engine} engine failed: {reason}")]
    Engine { engine: &'static str, reason: String },

    /// A stage of the AI fuzz pipeline failed.
    #[error("AI fuzz pipeline failed during {stage}: {reason}")]
    Pipeline { stage: &'static str, reason: String },

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AuditError {
    pub fn engine(engine: &'static str, reason: impl Into<String>) -> Self {
        AuditError::Engine {
            engine,
            reason: reason.into(),
        }
    }

    /// Whether the caller (rather than the system) is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuditError::InputValidation(_))
    }

    /// Text safe to hand back to the caller. Internal detail never leaks.
    pub fn client_message(&self) -> &str {
        match self {
            AuditError::InputValidation(message) => message,
            _ => GENERIC_FAILURE_MESSAGE,
        }
    }
}

impl From<UpstreamError> for AuditError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Decode { .. } | UpstreamError::EmptyCompletion => {
                AuditError::UpstreamParse(err.to_string())
            }
            other => AuditError::UpstreamFetch(other.to_string()),
        }
    }
}

impl From<ExecError> for AuditError {
    fn from(err: ExecError) -> Self {
        AuditError::engine("process", err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        AuditError::UpstreamParse(err.to_string())
    }
}

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        AuditError::Unexpected(err.to_string())
    }
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AuditError>;
