//! Iterative source-file discovery.

use std::collections::VecDeque;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Lazily yields every file with a given extension beneath a root.
///
/// Depth-first with an explicit stack: a directory's files come before its
/// subdirectories, both in name order. Hidden directories are skipped and
/// symlinks are not followed, so the walk always terminates. Unreadable
/// directories are logged and contribute nothing. Build a new walker to
/// restart.
#[derive(Debug, Clone)]
pub struct SourceWalker {
    extension: String,
    dirs: Vec<PathBuf>,
    files: VecDeque<PathBuf>,
}

impl SourceWalker {
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
            dirs: vec![root.into()],
            files: VecDeque::new(),
        }
    }

    fn expand(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                return;
            }
        };

        let mut entries: Vec<_> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                    None
                }
            })
            .collect();
        entries.sort_by_key(|entry| entry.file_name());

        let mut subdirs = Vec::new();
        for entry in entries {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();
            if file_type.is_dir() {
                if !is_hidden(&path) {
                    subdirs.push(path);
                }
            } else if file_type.is_file() && self.matches(&path) {
                self.files.push_back(path);
            }
        }

        self.dirs.extend(subdirs.into_iter().rev());
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension() == Some(OsStr::new(&self.extension))
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.starts_with('.'))
}

impl Iterator for SourceWalker {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if let Some(file) = self.files.pop_front() {
                return Some(file);
            }
            let dir = self.dirs.pop()?;
            self.expand(&dir);
        }
    }
}
