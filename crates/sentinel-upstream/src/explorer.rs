//! Blockchain explorer client
//!
//! Read-only lookups against an Etherscan-compatible API: verified source code
//! and ABI for a contract address.

use crate::error::UpstreamError;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const SERVICE: &str = "explorer";

/// Explorer's placeholder for a missing ABI.
const NOT_VERIFIED_ABI: &str = "Contract source code not verified";

/// Explorer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplorerConfig {
    /// API endpoint (query-string style, e.g. `https://api.etherscan.io/api`)
    pub base_url: String,
    /// Access credential
    pub api_key: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        ExplorerConfig {
            base_url: std::env::var("EXPLORER_API_URL")
                .unwrap_or_else(|_| "https://api.etherscan.io/api".to_string()),
            api_key: std::env::var("EXPLORER_API_KEY").unwrap_or_default(),
            request_timeout_secs: std::env::var("EXPLORER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl ExplorerConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific endpoint
    pub fn new(base_url: &str, api_key: &str) -> Self {
        ExplorerConfig {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Verified source as published on the explorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedSource {
    /// Flattened source text (never empty)
    pub source_code: String,
    /// ABI JSON published alongside the source, when present
    pub abi: Option<String>,
    /// Contract name reported by the explorer
    pub contract_name: Option<String>,
}

/// Source and ABI lookups keyed by contract address.
#[async_trait]
pub trait ContractExplorer: Send + Sync {
    /// Verified source text. `UpstreamError::NotVerified` when absent.
    async fn get_source_code(&self, address: &str) -> Result<VerifiedSource>;

    /// ABI JSON. `UpstreamError::AbiUnavailable` when absent.
    async fn get_abi(&self, address: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct EnvelopeResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: Value,
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    #[serde(rename = "SourceCode", default)]
    source_code: String,
    #[serde(rename = "ABI", default)]
    abi: String,
    #[serde(rename = "ContractName", default)]
    contract_name: String,
}

/// HTTP client for an Etherscan-compatible explorer
pub struct ExplorerClient {
    config: ExplorerConfig,
    http_client: reqwest::Client,
}

impl ExplorerClient {
    /// Create a new explorer client
    pub fn new(config: ExplorerConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("contract-sentinel/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(ExplorerClient {
            config,
            http_client,
        })
    }

    async fn query(&self, action: &str, address: &str) -> Result<EnvelopeResponse> {
        debug!(action, address, "querying explorer");

        let response = self
            .http_client
            .get(&self.config.base_url)
            .query(&[
                ("module", "contract"),
                ("action", action),
                ("address", address),
                ("apikey", self.config.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| UpstreamError::Decode {
            service: SERVICE,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl ContractExplorer for ExplorerClient {
    async fn get_source_code(&self, address: &str) -> Result<VerifiedSource> {
        let envelope = self.query("getsourcecode", address).await?;

        if envelope.status != "1" {
            warn!(address, message = %envelope.message, result = %envelope.result, "explorer refused source lookup");
            return Err(UpstreamError::NotVerified(address.to_string()));
        }

        let entries: Vec<SourceEntry> =
            serde_json::from_value(envelope.result).map_err(|e| UpstreamError::Decode {
                service: SERVICE,
                reason: e.to_string(),
            })?;

        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::NotVerified(address.to_string()))?;

        let source_code = flatten_source(&entry.source_code);
        if source_code.trim().is_empty() {
            return Err(UpstreamError::NotVerified(address.to_string()));
        }

        let abi = Some(entry.abi).filter(|abi| !abi.is_empty() && abi != NOT_VERIFIED_ABI);
        let contract_name = Some(entry.contract_name).filter(|name| !name.is_empty());

        info!(address, contract = ?contract_name, "fetched verified source");

        Ok(VerifiedSource {
            source_code,
            abi,
            contract_name,
        })
    }

    async fn get_abi(&self, address: &str) -> Result<String> {
        let envelope = self.query("getabi", address).await?;

        let result = match envelope.result {
            Value::String(s) => s,
            other => other.to_string(),
        };

        if envelope.status != "1" || result.is_empty() || result == NOT_VERIFIED_ABI {
            return Err(UpstreamError::AbiUnavailable {
                address: address.to_string(),
                reason: if result.is_empty() { envelope.message } else { result },
            });
        }

        Ok(result)
    }
}

/// Flatten an explorer `SourceCode` field into a single source text.
///
/// Single-file sources are returned unchanged. Multi-file submissions arrive
/// either as standard-JSON input wrapped in double braces (`{{ ... }}`) or as
/// a plain `{ "path": { "content": .. } }` object; each file is emitted with a
/// `// File: <path>` header, in key order.
pub fn flatten_source(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') {
        return raw.to_string();
    }

    let json_text = if trimmed.starts_with("{{") && trimmed.ends_with("}}") {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    let Ok(Value::Object(root)) = serde_json::from_str::<Value>(json_text) else {
        return raw.to_string();
    };

    let files = match root.get("sources") {
        Some(Value::Object(sources)) => sources,
        _ => &root,
    };

    let mut entries: Vec<(&String, &str)> = files
        .iter()
        .filter_map(|(path, file)| Some((path, file.get("content")?.as_str()?)))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let flattened: Vec<String> = entries
        .into_iter()
        .map(|(path, content)| format!("// File: {path}\n{content}"))
        .collect();

    if flattened.is_empty() {
        raw.to_string()
    } else {
        flattened.join("\n\n")
    }
}
