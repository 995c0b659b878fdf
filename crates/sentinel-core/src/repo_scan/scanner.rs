//! Batched, rate-limited static analysis of a cloned repository.

use super::walker::SourceWalker;
use super::workspace::ScanWorkspace;
use crate::config::Engines;
use crate::domain::FileAnalysisEntry;
use crate::engines::analyze_source;
use crate::error::{AuditError, Result};
use futures::future::join_all;
use sentinel_exec::shallow_clone;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Counters for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Source files found by the walker
    pub discovered: usize,
    /// Batches processed
    pub batches: usize,
    /// Inter-batch pauses taken
    pub pauses: usize,
    /// Files that produced an entry
    pub analyzed: usize,
    /// Files below the content threshold
    pub skipped: usize,
    /// Files whose read or analysis failed
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub files: Vec<FileAnalysisEntry>,
    pub stats: ScanStats,
}

enum FileScan {
    Analyzed(FileAnalysisEntry),
    Skipped,
    Failed,
}

pub struct RepoScanner {
    engines: Engines,
}

impl RepoScanner {
    pub fn new(engines: Engines) -> Self {
        Self { engines }
    }

    /// Clone `repo_url` into a fresh workspace and scan it.
    ///
    /// A failed clone fails the scan. Unreadable directories or files only
    /// shrink the result. The workspace is removed before returning.
    #[instrument(skip(self), fields(scan_id = %Uuid::new_v4()))]
    pub async fn scan(&self, repo_url: &str) -> Result<ScanOutcome> {
        let scan_config = &self.engines.config.scan;
        let workspace = ScanWorkspace::create(&scan_config.workspace_root)?;

        let clone = self
            .engines
            .runner
            .run(&shallow_clone(repo_url, workspace.path()))
            .await
            .map_err(|e| AuditError::engine("git", e.to_string()))?;
        if !clone.success() {
            warn!(exit_code = clone.exit_code, stderr = %clone.stderr.trim(), "clone failed");
            return Err(AuditError::engine(
                "git",
                format!("clone of {repo_url} exited with {}", clone.exit_code),
            ));
        }

        let root = workspace.path().to_path_buf();
        let extension = scan_config.source_extension.clone();
        let paths = tokio::task::spawn_blocking(move || {
            SourceWalker::new(root, &extension).collect::<Vec<_>>()
        })
        .await
        .map_err(|e| AuditError::Unexpected(format!("source walk aborted: {e}")))?;

        let outcome = self.scan_paths(workspace.path(), paths).await;

        if let Err(e) = workspace.close() {
            warn!(error = %e, "failed to remove scan workspace");
        }
        Ok(outcome)
    }

    /// Audit `paths` (all beneath `root`) in batches.
    ///
    /// Files within a batch run concurrently; batch n+1 starts only after
    /// batch n has fully settled and the configured delay has elapsed.
    pub async fn scan_paths(&self, root: &Path, paths: Vec<PathBuf>) -> ScanOutcome {
        let scan_config = &self.engines.config.scan;
        let batch_size = scan_config.batch_size.max(1);

        let mut stats = ScanStats {
            discovered: paths.len(),
            ..ScanStats::default()
        };
        let mut files = Vec::new();

        for (index, batch) in paths.chunks(batch_size).enumerate() {
            if index > 0 {
                debug!(delay_ms = scan_config.batch_delay_ms, "pausing between batches");
                tokio::time::sleep(scan_config.batch_delay()).await;
                stats.pauses += 1;
            }
            stats.batches += 1;
            debug!(batch = index + 1, size = batch.len(), "scanning batch");

            let results = join_all(batch.iter().map(|path| self.scan_file(root, path))).await;
            for result in results {
                match result {
                    FileScan::Analyzed(entry) => {
                        stats.analyzed += 1;
                        files.push(entry);
                    }
                    FileScan::Skipped => stats.skipped += 1,
                    FileScan::Failed => stats.failed += 1,
                }
            }
        }

        info!(
            discovered = stats.discovered,
            batches = stats.batches,
            analyzed = stats.analyzed,
            skipped = stats.skipped,
            failed = stats.failed,
            "repository scan finished"
        );
        ScanOutcome { files, stats }
    }

    async fn scan_file(&self, root: &Path, path: &Path) -> FileScan {
        let relative_path = relative_path(root, path);

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(file = %relative_path, error = %e, "could not read source file");
                return FileScan::Failed;
            }
        };

        if content.trim().chars().count() < self.engines.config.scan.min_content_len {
            debug!(file = %relative_path, "skipping short file");
            return FileScan::Skipped;
        }

        match analyze_source(self.engines.model.as_ref(), &content).await {
            Ok(analysis) => FileScan::Analyzed(FileAnalysisEntry {
                relative_path,
                analysis: Some(analysis),
            }),
            Err(e) => {
                warn!(file = %relative_path, error = %e, "file analysis failed");
                FileScan::Failed
            }
        }
    }
}

/// `path` relative to `root`, joined with `/`.
fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
