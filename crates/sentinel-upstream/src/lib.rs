//! Sentinel Upstream: explorer and language-model clients
//!
//! Two outbound collaborators sit behind traits so the orchestration core can
//! be driven by fakes:
//! - [`ContractExplorer`]: verified source and ABI lookups keyed by address
//! - [`LanguageModel`]: single-turn prompt/response exchanges
//!
//! Concrete HTTP clients are [`ExplorerClient`] (Etherscan-compatible) and
//! [`LlmClient`] (OpenAI-compatible chat completions).

pub mod error;
pub mod explorer;
pub mod fakes;
pub mod llm;

pub use error::UpstreamError;
pub use explorer::{flatten_source, ContractExplorer, ExplorerClient, ExplorerConfig, VerifiedSource};
pub use llm::{LanguageModel, LlmClient, LlmConfig, PromptRequest, PromptRole};

/// Result type for upstream calls
pub type Result<T> = std::result::Result<T, UpstreamError>;
