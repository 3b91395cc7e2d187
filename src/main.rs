//! `vigil`: reads one JSON `SafetyRequest` per stdin line and writes one
//! JSON `SafetyVerdict` per stdout line.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use vigil_lib::analytics::{spawn_analytics_worker, TracingSink};
use vigil_lib::config::{self, SafetyConfig};
use vigil_lib::{EvaluateOptions, SafetyOrchestrator, SafetyRequest};

const ANALYTICS_QUEUE: usize = 256;

#[tokio::main]
async fn main() -> ExitCode {
    vigil_lib::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = match SafetyConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(2);
        }
    };

    let (sink, worker) = spawn_analytics_worker(Arc::new(TracingSink), ANALYTICS_QUEUE);
    let orchestrator = SafetyOrchestrator::from_config(config).with_sink(Arc::new(sink));
    tracing::info!(
        rule_set = orchestrator.rules().version(),
        red_flags = orchestrator.rules().red_flags().len(),
        "Rule repository loaded"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut evaluated = 0usize;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stdin");
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let verdict = match serde_json::from_str::<SafetyRequest>(&line) {
            Ok(request) => orchestrator.evaluate_request(&request),
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable request line");
                orchestrator.evaluate(None, &EvaluateOptions::default())
            }
        };

        let mut out = match serde_json::to_string(&verdict) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize verdict");
                continue;
            }
        };
        out.push('\n');
        if let Err(e) = stdout.write_all(out.as_bytes()).await {
            tracing::error!(error = %e, "Failed to write verdict");
            return ExitCode::FAILURE;
        }
        evaluated += 1;
    }

    if let Err(e) = stdout.flush().await {
        tracing::warn!(error = %e, "Failed to flush stdout");
    }

    // Dropping the orchestrator drops the last sink handle and lets the
    // worker drain.
    drop(orchestrator);
    match worker.await {
        Ok(forwarded) => tracing::info!(evaluated, forwarded, "Done"),
        Err(e) => tracing::warn!(error = %e, "Analytics worker ended abnormally"),
    }
    ExitCode::SUCCESS
}
