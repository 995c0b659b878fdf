//! Adapters for the individual analysis engines.
//!
//! Each adapter returns `Err` on its own failure; isolation and fallback
//! values are the orchestrator's job.

pub mod generic_fuzz;
pub mod honeypot;
pub mod static_analysis;

pub use generic_fuzz::{classify_harness_output, run_generic_suite, HarnessVerdict};
pub use honeypot::simulate;
pub use static_analysis::analyze_source;
