//! In-memory fakes for the upstream traits (testing only)
//!
//! Provides `FakeExplorer` and `ScriptedModel`, which satisfy the trait
//! contracts without network access and record what they were asked.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::UpstreamError;
use crate::explorer::{ContractExplorer, VerifiedSource};
use crate::llm::{LanguageModel, PromptRequest, PromptRole};
use crate::Result;

// ---------------------------------------------------------------------------
// FakeExplorer
// ---------------------------------------------------------------------------

/// Explorer backed by two maps keyed by lowercase address.
#[derive(Debug, Default)]
pub struct FakeExplorer {
    sources: HashMap<String, VerifiedSource>,
    abis: HashMap<String, String>,
    abi_lookups: AtomicUsize,
}

impl FakeExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish verified source (and its ABI, if any) for `address`.
    pub fn with_source(mut self, address: &str, source_code: &str, abi: Option<&str>) -> Self {
        self.sources.insert(
            address.to_lowercase(),
            VerifiedSource {
                source_code: source_code.to_string(),
                abi: abi.map(str::to_string),
                contract_name: None,
            },
        );
        self
    }

    /// Publish an ABI reachable through `get_abi` only.
    pub fn with_abi(mut self, address: &str, abi: &str) -> Self {
        self.abis.insert(address.to_lowercase(), abi.to_string());
        self
    }

    /// Number of `get_abi` calls served.
    pub fn abi_lookups(&self) -> usize {
        self.abi_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractExplorer for FakeExplorer {
    async fn get_source_code(&self, address: &str) -> Result<VerifiedSource> {
        self.sources
            .get(&address.to_lowercase())
            .filter(|s| !s.source_code.trim().is_empty())
            .cloned()
            .ok_or_else(|| UpstreamError::NotVerified(address.to_string()))
    }

    async fn get_abi(&self, address: &str) -> Result<String> {
        self.abi_lookups.fetch_add(1, Ordering::SeqCst);
        self.abis
            .get(&address.to_lowercase())
            .cloned()
            .ok_or_else(|| UpstreamError::AbiUnavailable {
                address: address.to_string(),
                reason: "Contract source code not verified".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// ScriptedModel
// ---------------------------------------------------------------------------

type Script = Arc<dyn Fn(&str) -> std::result::Result<String, String> + Send + Sync>;

/// Language model whose replies are scripted per [`PromptRole`].
///
/// Roles without a script fail with `UpstreamError::Api`. Tracks in-flight
/// calls so tests can observe concurrency.
#[derive(Default)]
pub struct ScriptedModel {
    scripts: HashMap<PromptRole, Script>,
    latency: Option<Duration>,
    requests: Mutex<Vec<(Instant, PromptRequest)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `role` prompts with `reply`.
    pub fn reply(self, role: PromptRole, reply: &str) -> Self {
        let reply = reply.to_string();
        self.reply_with(role, move |_| Ok(reply.clone()))
    }

    /// Always fail `role` prompts.
    pub fn fail(self, role: PromptRole, message: &str) -> Self {
        let message = message.to_string();
        self.reply_with(role, move |_| Err(message.clone()))
    }

    /// Compute the reply (or failure message) from the prompt text.
    pub fn reply_with<F>(mut self, role: PromptRole, script: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<String, String> + Send + Sync + 'static,
    {
        self.scripts.insert(role, Arc::new(script));
        self
    }

    /// Delay every reply by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Prompts received so far, in arrival order.
    pub fn requests(&self) -> Vec<PromptRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Arrival time of each prompt, in arrival order.
    pub fn arrival_times(&self) -> Vec<Instant> {
        self.requests.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    /// Number of prompts received for `role`.
    pub fn call_count(&self, role: PromptRole) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, r)| r.role == role)
            .count()
    }

    /// Highest number of prompts that were awaiting a reply at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: PromptRequest) -> Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let reply = match self.scripts.get(&request.role) {
            Some(script) => script(&request.prompt).map_err(UpstreamError::Api),
            None => Err(UpstreamError::Api(format!(
                "no scripted reply for {} prompts",
                request.role
            ))),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_explorer_lookups() {
        let explorer = FakeExplorer::new()
            .with_source("0xABC", "contract A {}", Some("[]"))
            .with_abi("0xabc", "[{\"type\":\"function\"}]");

        let source = explorer.get_source_code("0xabc").await.unwrap();
        assert_eq!(source.source_code, "contract A {}");
        assert_eq!(source.abi.as_deref(), Some("[]"));

        assert!(explorer.get_abi("0xABC").await.is_ok());
        assert_eq!(explorer.abi_lookups(), 1);

        let missing = explorer.get_source_code("0xdef").await.unwrap_err();
        assert!(matches!(missing, UpstreamError::NotVerified(_)));
    }

    #[tokio::test]
    async fn test_fake_explorer_empty_source_is_not_verified() {
        let explorer = FakeExplorer::new().with_source("0xabc", "   ", None);
        let err = explorer.get_source_code("0xabc").await.unwrap_err();
        assert!(matches!(err, UpstreamError::NotVerified(_)));
    }

    #[tokio::test]
    async fn test_scripted_model_by_role() {
        let model = ScriptedModel::new()
            .reply(PromptRole::Audit, "{}")
            .fail(PromptRole::TestGeneration, "quota exceeded");

        let ok = model
            .complete(PromptRequest::new(PromptRole::Audit, "src"))
            .await
            .unwrap();
        assert_eq!(ok, "{}");

        let err = model
            .complete(PromptRequest::new(PromptRole::TestGeneration, "abi"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));

        let unscripted = model
            .complete(PromptRequest::new(PromptRole::FailureInterpretation, "log"))
            .await;
        assert!(unscripted.is_err());

        assert_eq!(model.requests().len(), 3);
        assert_eq!(model.call_count(PromptRole::Audit), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_model_tracks_concurrency() {
        let model = ScriptedModel::new()
            .reply(PromptRole::Audit, "{}")
            .with_latency(Duration::from_millis(100));

        let (a, b, c) = tokio::join!(
            model.complete(PromptRequest::new(PromptRole::Audit, "a")),
            model.complete(PromptRequest::new(PromptRole::Audit, "b")),
            model.complete(PromptRequest::new(PromptRole::Audit, "c")),
        );

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(model.max_in_flight(), 3);
        assert_eq!(model.arrival_times().len(), 3);
    }
}
