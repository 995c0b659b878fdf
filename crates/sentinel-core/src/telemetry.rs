//! Tracing initialisation for the Sentinel binaries.
//!
//! [`init_tracing`] installs the global subscriber once; later calls are
//! no-ops and report `false`.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Noisy HTTP dependencies are capped at `warn` unless `RUST_LOG` says
/// otherwise.
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "h2=warn"];

/// Install the global subscriber.
///
/// * `json`: newline-delimited JSON with the current span's fields, for log
///   shipping. Plain text otherwise.
/// * `level`: verbosity used when `RUST_LOG` is unset or invalid.
///
/// Returns whether this call installed the subscriber.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };
    installed.is_ok()
}

fn default_filter(level: Level) -> EnvFilter {
    EnvFilter::new(default_directives(level))
}

fn default_directives(level: Level) -> String {
    std::iter::once(level.as_str().to_ascii_lowercase())
        .chain(QUIET_TARGETS.iter().map(|t| t.to_string()))
        .collect::<Vec<_>>()
        .join(",")
}
