//! Repository batch scanner
//!
//! Clone into a per-scan workspace, walk it for source files, and audit them
//! in fixed-size concurrent batches separated by a rate-limiting pause.

pub mod scanner;
pub mod walker;
pub mod workspace;

pub use scanner::{RepoScanner, ScanOutcome, ScanStats};
pub use walker::SourceWalker;
pub use workspace::ScanWorkspace;
