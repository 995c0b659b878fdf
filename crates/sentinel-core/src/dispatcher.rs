//! Request validation and routing.

use crate::config::Engines;
use crate::domain::{
    AnalysisReport, AnalysisRequest, FileAnalysisEntry, FileReport, InputKind, RawAnalysisRequest,
    SNIPPET_FILE_NAME,
};
use crate::engines::analyze_source;
use crate::error::Result;
use crate::orchestrator::analyze_address;
use crate::repo_scan::RepoScanner;
use tracing::{error, info, instrument, warn};

/// Entry point shared by the HTTP service and the CLI.
#[derive(Clone)]
pub struct AnalysisService {
    engines: Engines,
}

impl AnalysisService {
    pub fn new(engines: Engines) -> Self {
        Self { engines }
    }

    /// Validate `raw` and dispatch it. Failures are logged with full detail
    /// here; callers only need [`crate::AuditError::client_message`].
    pub async fn handle(&self, raw: RawAnalysisRequest) -> Result<AnalysisReport> {
        let request = AnalysisRequest::parse(raw).inspect_err(|e| {
            warn!(error = %e, "rejected analysis request");
        })?;

        self.dispatch(request).await.inspect_err(|e| {
            error!(error = %e, "analysis failed");
        })
    }

    /// Route a validated request to exactly one pipeline.
    #[instrument(skip(self, request), fields(kind = %request.kind))]
    pub async fn dispatch(&self, request: AnalysisRequest) -> Result<AnalysisReport> {
        info!("analysis requested");
        let report = match request.kind {
            InputKind::Address => {
                AnalysisReport::Address(analyze_address(&self.engines, &request.payload).await?)
            }
            InputKind::Repository => {
                let outcome = RepoScanner::new(self.engines.clone())
                    .scan(&request.payload)
                    .await?;
                AnalysisReport::Repository(FileReport {
                    files: outcome.files,
                })
            }
            InputKind::Snippet => {
                let analysis = analyze_source(self.engines.model.as_ref(), &request.payload).await?;
                AnalysisReport::Snippet(FileReport {
                    files: vec![FileAnalysisEntry {
                        relative_path: SNIPPET_FILE_NAME.to_string(),
                        analysis: Some(analysis),
                    }],
                })
            }
        };
        info!(report_type = %report.kind(), "analysis complete");
        Ok(report)
    }
}
