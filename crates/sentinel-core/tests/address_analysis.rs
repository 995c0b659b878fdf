//! Address orchestration against in-memory engines.

use std::sync::Arc;
use std::time::Duration;

use sentinel_core::ai_fuzz::UNAVAILABLE_REASON;
use sentinel_core::engines::generic_fuzz::INCOMPATIBLE_REASON;
use sentinel_core::orchestrator::{GENERIC_FALLBACK_REASON, HONEYPOT_FALLBACK_REASON};
use sentinel_core::{
    analyze_address, AuditError, Engines, FuzzOutcome, FuzzStatus, RiskLevel, SentinelConfig,
    GENERIC_FAILURE_MESSAGE,
};
use sentinel_exec::fakes::FakeProcessRunner;
use sentinel_exec::{HarnessConfig, ProcessOutput};
use sentinel_upstream::fakes::{FakeExplorer, ScriptedModel};
use sentinel_upstream::PromptRole;
use tempfile::TempDir;

const ADDRESS: &str = "0xabc";
const SOURCE: &str = "pragma solidity ^0.8.0;\ncontract Vault { function withdraw() external {} }";
const AUDIT_REPLY: &str =
    "```json\n{\"riskScore\":\"Medium\",\"summary\":\"Missing checks\",\"findings\":[]}\n```";
const TEST_REPLY: &str = "```solidity\ncontract AIGeneratedFuzzer {}\n```";
const HONEYPOT_OK: &str = "{\"isHoneypot\":false,\"reason\":\"Withdrawal succeeded.\"}";

struct Fixture {
    _harness_dir: TempDir,
    engines: Engines,
    model: Arc<ScriptedModel>,
    runner: Arc<FakeProcessRunner>,
}

fn fixture(explorer: FakeExplorer, model: ScriptedModel, runner: FakeProcessRunner) -> Fixture {
    let harness_dir = TempDir::new().unwrap();
    let config = SentinelConfig {
        harness: HarnessConfig {
            workspace: harness_dir.path().to_path_buf(),
            honeypot_script: "honeypot/simulate.js".into(),
            compiler_error_marker: "Compiler run failed".to_string(),
            timeout_secs: 0,
            ..HarnessConfig::default()
        },
        ..SentinelConfig::default()
    };
    let model = Arc::new(model);
    let runner = Arc::new(runner);
    let engines = Engines::new(Arc::new(explorer), model.clone(), runner.clone(), config);
    Fixture {
        _harness_dir: harness_dir,
        engines,
        model,
        runner,
    }
}

fn verified() -> FakeExplorer {
    FakeExplorer::new().with_source(ADDRESS, SOURCE, Some("[]"))
}

fn healthy_runner() -> FakeProcessRunner {
    FakeProcessRunner::new()
        .on("simulate.js", ProcessOutput::ok(HONEYPOT_OK))
        .on("--match-contract", ProcessOutput::ok("[PASS] invariant_totalSupply()"))
        .on("--match-path", ProcessOutput::ok("[PASS] testFuzz_transfer()"))
}

fn healthy_model() -> ScriptedModel {
    ScriptedModel::new()
        .reply(PromptRole::Audit, AUDIT_REPLY)
        .reply(PromptRole::TestGeneration, TEST_REPLY)
}

#[tokio::test]
async fn test_all_engines_succeed() {
    let fx = fixture(verified(), healthy_model(), healthy_runner());

    let report = analyze_address(&fx.engines, ADDRESS).await.unwrap();

    assert_eq!(report.static_analysis.unwrap().risk_score, RiskLevel::Medium);
    assert!(!report.dynamic_analysis.is_honeypot);
    assert_eq!(report.generic_fuzzing.status, FuzzStatus::Passed);
    assert_eq!(report.ai_fuzzing.status, FuzzStatus::Passed);
    assert_eq!(fx.runner.calls().len(), 3);
}

#[tokio::test]
async fn test_static_failure_does_not_change_other_engines() {
    let baseline = fixture(verified(), healthy_model(), healthy_runner());
    let baseline = analyze_address(&baseline.engines, ADDRESS).await.unwrap();

    let broken_model = ScriptedModel::new()
        .fail(PromptRole::Audit, "inference service down")
        .reply(PromptRole::TestGeneration, TEST_REPLY);
    let fx = fixture(verified(), broken_model, healthy_runner());
    let report = analyze_address(&fx.engines, ADDRESS).await.unwrap();

    assert!(report.static_analysis.is_none());
    assert_eq!(report.dynamic_analysis, baseline.dynamic_analysis);
    assert_eq!(report.generic_fuzzing, baseline.generic_fuzzing);
    assert_eq!(report.ai_fuzzing, baseline.ai_fuzzing);
}

#[tokio::test]
async fn test_every_engine_failing_still_fills_every_field() {
    let runner = FakeProcessRunner::new()
        .fail_on("simulate.js")
        .fail_on("forge");
    let fx = fixture(verified(), ScriptedModel::new(), runner);

    let report = analyze_address(&fx.engines, ADDRESS).await.unwrap();

    assert!(report.static_analysis.is_none());
    assert!(!report.dynamic_analysis.is_honeypot);
    assert_eq!(report.dynamic_analysis.reason, HONEYPOT_FALLBACK_REASON);
    assert_eq!(
        report.generic_fuzzing,
        FuzzOutcome::incompatible(GENERIC_FALLBACK_REASON)
    );
    assert_eq!(report.ai_fuzzing, FuzzOutcome::incompatible(UNAVAILABLE_REASON));

    let json = serde_json::to_value(&report).unwrap();
    for key in ["staticAnalysis", "dynamicAnalysis", "genericFuzzing", "aiFuzzing"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert!(json["staticAnalysis"].is_null());
}

#[tokio::test]
async fn test_generic_compiler_error_is_incompatible() {
    let runner = FakeProcessRunner::new()
        .on("simulate.js", ProcessOutput::ok(HONEYPOT_OK))
        .on(
            "--match-contract",
            ProcessOutput::failed(1, "Error: Compiler run failed:\nError (7576): Undeclared identifier."),
        )
        .on("--match-path", ProcessOutput::ok(""));
    let fx = fixture(verified(), healthy_model(), runner);

    let report = analyze_address(&fx.engines, ADDRESS).await.unwrap();

    let json = serde_json::to_value(&report.generic_fuzzing).unwrap();
    assert_eq!(json["status"], "incompatible");
    assert_eq!(json["reason"], INCOMPATIBLE_REASON);
}

#[tokio::test]
async fn test_ai_fuzz_failure_is_interpreted() {
    let runner = FakeProcessRunner::new()
        .on("simulate.js", ProcessOutput::ok(HONEYPOT_OK))
        .on("--match-contract", ProcessOutput::ok(""))
        .on(
            "--match-path",
            ProcessOutput::failed(
                1,
                "[FAIL. Reason: Mint exceeded cap; counterexample: amount=2**255] testFuzz_mint(uint256)",
            ),
        );
    let model = healthy_model().reply(
        PromptRole::FailureInterpretation,
        "mint(uint256) accepts amounts above the cap, letting anyone inflate supply.",
    );
    let fx = fixture(verified(), model, runner);

    let report = analyze_address(&fx.engines, ADDRESS).await.unwrap();

    assert_eq!(report.ai_fuzzing.status, FuzzStatus::Failed);
    assert_eq!(
        report.ai_fuzzing.detail,
        "mint(uint256) accepts amounts above the cap, letting anyone inflate supply."
    );
    assert_eq!(fx.model.call_count(PromptRole::FailureInterpretation), 1);
    let interpretation = fx
        .model
        .requests()
        .into_iter()
        .find(|r| r.role == PromptRole::FailureInterpretation)
        .unwrap();
    assert!(interpretation.prompt.contains("Mint exceeded cap"));
}

#[tokio::test]
async fn test_missing_source_fails_whole_request() {
    let explorer = FakeExplorer::new().with_source("0xABC", "", None);
    let fx = fixture(explorer, healthy_model(), healthy_runner());

    let err = analyze_address(&fx.engines, "0xABC").await.unwrap_err();

    assert!(matches!(err, AuditError::UpstreamFetch(_)));
    assert!(!err.is_client_error());
    assert_eq!(err.client_message(), GENERIC_FAILURE_MESSAGE);
    assert!(fx.runner.calls().is_empty());
    assert!(fx.model.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_engines_run_concurrently() {
    let runner = FakeProcessRunner::new()
        .on_delayed("simulate.js", ProcessOutput::ok(HONEYPOT_OK), Duration::from_secs(3))
        .on_delayed("--match-contract", ProcessOutput::ok(""), Duration::from_secs(3))
        .on_delayed("--match-path", ProcessOutput::ok(""), Duration::from_secs(3));
    let model = healthy_model().with_latency(Duration::from_secs(1));
    let fx = fixture(verified(), model, runner);

    let start = tokio::time::Instant::now();
    let report = analyze_address(&fx.engines, ADDRESS).await.unwrap();
    let elapsed = start.elapsed();

    assert!(report.static_analysis.is_some());
    assert_eq!(report.ai_fuzzing.status, FuzzStatus::Passed);
    // Sequential execution would take 1 + 3 + 3 + 1 + 3 seconds.
    assert!(elapsed >= Duration::from_secs(4), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "elapsed {elapsed:?}");
    assert_eq!(fx.model.max_in_flight(), 2);
}
