pub mod analytics;
pub mod config;
pub mod emergency;
pub mod generator;
pub mod models;
pub mod routing;
pub mod rules;
pub mod safety;
pub mod triage;

mod privacy_audit;

pub use safety::{EvaluateOptions, SafeResponse, SafetyOrchestrator, SafetyRequest, SafetyVerdict};

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
/// Logs go to stderr; stdout belongs to the verdict stream.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}
