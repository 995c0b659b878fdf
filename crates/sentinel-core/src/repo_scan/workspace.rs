//! Per-scan ephemeral workspace.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// A uniquely-named directory owned by a single scan.
///
/// Created fresh under the configured root and removed when dropped, on
/// every exit path. [`ScanWorkspace::close`] removes it eagerly and reports
/// failures.
#[derive(Debug)]
pub struct ScanWorkspace {
    dir: TempDir,
}

impl ScanWorkspace {
    pub fn create(root: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix("scan-").tempdir_in(root)?;
        debug!(path = %dir.path().display(), "scan workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn close(self) -> io::Result<()> {
        let path: PathBuf = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(path = %path.display(), "scan workspace removed");
        Ok(())
    }
}
