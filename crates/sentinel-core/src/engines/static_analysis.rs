//! LLM-backed static audit.

use crate::domain::StaticAnalysisResult;
use crate::error::{AuditError, Result};
use crate::fence::strip_code_fences;
use crate::prompts::audit_prompt;
use sentinel_upstream::{LanguageModel, PromptRequest, PromptRole};
use tracing::{debug, instrument};

/// Audit `source` with the language model.
#[instrument(skip_all, fields(chars = source.len()))]
pub async fn analyze_source(model: &dyn LanguageModel, source: &str) -> Result<StaticAnalysisResult> {
    if source.trim().is_empty() {
        return Err(AuditError::engine("static", "source text is empty"));
    }

    let reply = model
        .complete(PromptRequest::new(PromptRole::Audit, audit_prompt(source)))
        .await?;

    let result = parse_audit_reply(&reply)?;
    debug!(risk = %result.risk_score, findings = result.findings.len(), "audit parsed");
    Ok(result)
}

/// Parse a model reply, tolerating markdown fences around the JSON.
pub fn parse_audit_reply(reply: &str) -> Result<StaticAnalysisResult> {
    let cleaned = strip_code_fences(reply);
    serde_json::from_str(&cleaned)
        .map_err(|e| AuditError::UpstreamParse(format!("audit reply is not a valid result: {e}")))
}
