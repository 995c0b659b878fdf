//! Request and report types shared by every pipeline.
//!
//! Wire names follow the inbound JSON contract: camelCase fields, a
//! `reportType` tag on reports and lowercase fuzz statuses.

use crate::error::{AuditError, Result, INVALID_INPUT_TYPE_MESSAGE, MISSING_INPUT_MESSAGE};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// File name reported for pasted snippets.
pub const SNIPPET_FILE_NAME: &str = "PastedCode.sol";

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// What kind of artifact a request points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Deployed contract address
    Address,
    /// Source repository URL
    Repository,
    /// Pasted source text
    Snippet,
}

impl InputKind {
    /// Parse the wire value of `inputType`.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "address" => Some(InputKind::Address),
            "github" => Some(InputKind::Repository),
            "text" => Some(InputKind::Snippet),
            _ => None,
        }
    }

    /// Wire value, also used as the report tag.
    pub fn wire_name(&self) -> &'static str {
        match self {
            InputKind::Address => "address",
            InputKind::Repository => "github",
            InputKind::Snippet => "text",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Inbound body before validation. Both fields are optional so that missing
/// and `null` values reach [`AnalysisRequest::parse`] instead of failing
/// deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnalysisRequest {
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
}

impl RawAnalysisRequest {
    pub fn new(input_type: &str, input: &str) -> Self {
        Self {
            input_type: Some(input_type.to_string()),
            input: Some(input.to_string()),
        }
    }
}

/// A validated analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub kind: InputKind,
    pub payload: String,
}

impl AnalysisRequest {
    /// Validate a raw request. Empty strings count as missing.
    pub fn parse(raw: RawAnalysisRequest) -> Result<Self> {
        let input_type = raw.input_type.filter(|t| !t.is_empty());
        let payload = raw.input.filter(|p| !p.is_empty());

        let (Some(input_type), Some(payload)) = (input_type, payload) else {
            return Err(AuditError::InputValidation(MISSING_INPUT_MESSAGE.to_string()));
        };

        let kind = InputKind::from_wire(&input_type)
            .ok_or_else(|| AuditError::InputValidation(INVALID_INPUT_TYPE_MESSAGE.to_string()))?;

        Ok(AnalysisRequest { kind, payload })
    }
}

// ---------------------------------------------------------------------------
// Static analysis
// ---------------------------------------------------------------------------

/// Coarse severity shared by risk scores and individual findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Finding severities use the same four levels as risk scores.
pub type Severity = RiskLevel;

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    /// Case-insensitive; anything outside the four levels is rejected.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            _ => Err(format!(
                "unknown risk level `{s}`, expected Low, Medium, High or Critical"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One issue reported by the audit model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Structured audit result for one source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticAnalysisResult {
    pub risk_score: RiskLevel,
    pub summary: String,
    #[serde(default)]
    pub findings: Vec<Finding>,
}

// ---------------------------------------------------------------------------
// Dynamic analysis and fuzzing
// ---------------------------------------------------------------------------

/// Honeypot simulator verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoneypotVerdict {
    pub is_honeypot: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuzzStatus {
    Passed,
    Failed,
    /// The suite did not apply to the target (e.g. it never compiled).
    Incompatible,
}

/// Outcome of one fuzzing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzOutcome {
    pub status: FuzzStatus,
    #[serde(rename = "reason")]
    pub detail: String,
}

impl FuzzOutcome {
    pub fn passed(detail: impl Into<String>) -> Self {
        Self {
            status: FuzzStatus::Passed,
            detail: detail.into(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            status: FuzzStatus::Failed,
            detail: detail.into(),
        }
    }

    pub fn incompatible(detail: impl Into<String>) -> Self {
        Self {
            status: FuzzStatus::Incompatible,
            detail: detail.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Per-file static analysis entry of a repository or snippet report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysisEntry {
    /// Workspace-relative path with `/` separators
    #[serde(rename = "file")]
    pub relative_path: String,
    pub analysis: Option<StaticAnalysisResult>,
}

/// Merged result of the four address engines. Every field is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressReport {
    /// `null` when the static engine failed
    pub static_analysis: Option<StaticAnalysisResult>,
    pub dynamic_analysis: HoneypotVerdict,
    pub generic_fuzzing: FuzzOutcome,
    pub ai_fuzzing: FuzzOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileReport {
    pub files: Vec<FileAnalysisEntry>,
}

/// Report returned by the dispatcher, tagged by `reportType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reportType")]
pub enum AnalysisReport {
    #[serde(rename = "address")]
    Address(AddressReport),
    #[serde(rename = "github")]
    Repository(FileReport),
    #[serde(rename = "text")]
    Snippet(FileReport),
}

impl AnalysisReport {
    pub fn kind(&self) -> InputKind {
        match self {
            AnalysisReport::Address(_) => InputKind::Address,
            AnalysisReport::Repository(_) => InputKind::Repository,
            AnalysisReport::Snippet(_) => InputKind::Snippet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_requests() {
        let req = AnalysisRequest::parse(RawAnalysisRequest::new("address", "0xABC")).unwrap();
        assert_eq!(req.kind, InputKind::Address);
        assert_eq!(req.payload, "0xABC");

        let req = AnalysisRequest::parse(RawAnalysisRequest::new("github", "https://x/y")).unwrap();
        assert_eq!(req.kind, InputKind::Repository);

        let req = AnalysisRequest::parse(RawAnalysisRequest::new("text", "contract C {}")).unwrap();
        assert_eq!(req.kind, InputKind::Snippet);
    }

    #[test]
    fn test_parse_missing_fields() {
        let cases = [
            RawAnalysisRequest::default(),
            RawAnalysisRequest {
                input_type: Some("address".to_string()),
                input: None,
            },
            RawAnalysisRequest {
                input_type: None,
                input: Some("0xabc".to_string()),
            },
            RawAnalysisRequest::new("", "0xabc"),
            RawAnalysisRequest::new("address", ""),
        ];

        for raw in cases {
            let err = AnalysisRequest::parse(raw).unwrap_err();
            assert!(err.is_client_error());
            assert_eq!(err.client_message(), MISSING_INPUT_MESSAGE);
        }
    }

    #[test]
    fn test_parse_unknown_input_type() {
        let err = AnalysisRequest::parse(RawAnalysisRequest::new("gitlab", "x")).unwrap_err();
        assert_eq!(err.client_message(), INVALID_INPUT_TYPE_MESSAGE);
    }

    #[test]
    fn test_raw_request_accepts_null_fields() {
        let raw: RawAnalysisRequest =
            serde_json::from_value(json!({ "inputType": null, "input": "0xabc" })).unwrap();
        assert!(raw.input_type.is_none());
        assert_eq!(raw.input.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_risk_level_is_case_insensitive() {
        assert_eq!("high".parse::<RiskLevel>().unwrap(), RiskLevel::High);
        assert_eq!(" CRITICAL ".parse::<RiskLevel>().unwrap(), RiskLevel::Critical);
        assert!("Severe".parse::<RiskLevel>().is_err());
        assert_eq!(serde_json::to_value(RiskLevel::Medium).unwrap(), json!("Medium"));
    }

    #[test]
    fn test_static_result_defaults_findings() {
        let result: StaticAnalysisResult =
            serde_json::from_value(json!({ "riskScore": "low", "summary": "fine" })).unwrap();
        assert_eq!(result.risk_score, RiskLevel::Low);
        assert!(result.findings.is_empty());

        let err = serde_json::from_value::<StaticAnalysisResult>(
            json!({ "riskScore": "Extreme", "summary": "?" }),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_address_report_wire_shape() {
        let report = AnalysisReport::Address(AddressReport {
            static_analysis: None,
            dynamic_analysis: HoneypotVerdict {
                is_honeypot: false,
                reason: "Honeypot check failed.".to_string(),
            },
            generic_fuzzing: FuzzOutcome::incompatible("Generic fuzzing failed."),
            ai_fuzzing: FuzzOutcome::passed("ok"),
        });

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["reportType"], "address");
        assert!(value["staticAnalysis"].is_null());
        assert_eq!(value["dynamicAnalysis"]["isHoneypot"], false);
        assert_eq!(value["genericFuzzing"]["status"], "incompatible");
        assert_eq!(value["genericFuzzing"]["reason"], "Generic fuzzing failed.");
        assert_eq!(value["aiFuzzing"]["status"], "passed");
    }

    #[test]
    fn test_file_report_wire_shape() {
        let report = AnalysisReport::Snippet(FileReport {
            files: vec![FileAnalysisEntry {
                relative_path: SNIPPET_FILE_NAME.to_string(),
                analysis: Some(StaticAnalysisResult {
                    risk_score: RiskLevel::High,
                    summary: "reentrancy".to_string(),
                    findings: vec![Finding {
                        title: "Reentrancy".to_string(),
                        description: "external call before state update".to_string(),
                        severity: RiskLevel::High,
                        recommendation: None,
                    }],
                }),
            }],
        });

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["reportType"], "text");
        assert_eq!(value["files"][0]["file"], "PastedCode.sol");
        assert_eq!(value["files"][0]["analysis"]["riskScore"], "High");
        assert_eq!(value["files"][0]["analysis"]["findings"][0]["severity"], "High");
        assert!(value["files"][0]["analysis"]["findings"][0]
            .get("recommendation")
            .is_none());
        assert_eq!(report.kind(), InputKind::Snippet);
    }
}
