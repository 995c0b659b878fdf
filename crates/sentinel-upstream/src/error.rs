//! Error types for sentinel-upstream

use thiserror::Error;

/// Errors that can occur talking to the explorer or the inference service
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Transport-level failure (connect, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success HTTP status
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Response body did not have the expected shape
    #[error("failed to decode {service} response: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },

    /// Explorer has no verified source for the address
    #[error("no verified source code for {0}")]
    NotVerified(String),

    /// Explorer returned no ABI for the address
    #[error("ABI unavailable for {address}: {reason}")]
    AbiUnavailable { address: String, reason: String },

    /// Inference service answered without any content
    #[error("language model returned an empty completion")]
    EmptyCompletion,

    /// Inference service reported an error object
    #[error("language model API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Http(err.to_string())
    }
}
