//! Process-wide configuration and the shared engine bundle.

use crate::error::Result;
use sentinel_exec::{HarnessConfig, ProcessRunner, TokioProcessRunner};
use sentinel_upstream::{
    ContractExplorer, ExplorerClient, ExplorerConfig, LanguageModel, LlmClient, LlmConfig,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Repository scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    /// Directory under which each scan creates its own workspace
    pub workspace_root: PathBuf,
    /// Files analyzed concurrently per batch
    pub batch_size: usize,
    /// Pause between consecutive batches, in milliseconds
    pub batch_delay_ms: u64,
    /// Files whose trimmed content is shorter than this are skipped
    pub min_content_len: usize,
    /// Source file extension, without the dot
    pub source_extension: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            workspace_root: std::env::var("SCAN_WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir().join("contract-sentinel")),
            batch_size: env_parse("SCAN_BATCH_SIZE", 5usize).max(1),
            batch_delay_ms: env_parse("SCAN_BATCH_DELAY_MS", 2000),
            min_content_len: env_parse("SCAN_MIN_CONTENT_LEN", 50),
            source_extension: "sol".to_string(),
        }
    }
}

impl ScanConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Everything the service needs, read once at start-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SentinelConfig {
    pub explorer: ExplorerConfig,
    pub llm: LlmConfig,
    pub harness: HarnessConfig,
    pub scan: ScanConfig,
}

impl SentinelConfig {
    pub fn from_env() -> Self {
        SentinelConfig {
            explorer: ExplorerConfig::from_env(),
            llm: LlmConfig::from_env(),
            harness: HarnessConfig::from_env(),
            scan: ScanConfig::from_env(),
        }
    }
}

/// Shared handles to every external collaborator.
///
/// Built once at process start and cloned (cheaply) into each task.
#[derive(Clone)]
pub struct Engines {
    pub explorer: Arc<dyn ContractExplorer>,
    pub model: Arc<dyn LanguageModel>,
    pub runner: Arc<dyn ProcessRunner>,
    pub config: Arc<SentinelConfig>,
    /// Serializes use of the fixed generated-test path in the fuzz harness.
    pub(crate) harness_lock: Arc<Mutex<()>>,
}

impl Engines {
    pub fn new(
        explorer: Arc<dyn ContractExplorer>,
        model: Arc<dyn LanguageModel>,
        runner: Arc<dyn ProcessRunner>,
        config: SentinelConfig,
    ) -> Self {
        Engines {
            explorer,
            model,
            runner,
            config: Arc::new(config),
            harness_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Real HTTP clients and a tokio process runner.
    pub fn from_config(config: SentinelConfig) -> Result<Self> {
        let explorer = ExplorerClient::new(config.explorer.clone())?;
        let model = LlmClient::new(config.llm.clone())?;
        Ok(Self::new(
            Arc::new(explorer),
            Arc::new(model),
            Arc::new(TokioProcessRunner::new()),
            config,
        ))
    }
}
