//! Equinix Fabric bandwidth stats collector
//!
//! Runs one collection pass and exits:
//! - authenticate against the Fabric API
//! - enumerate OUTGOING/INTERNAL connections
//! - fetch 24h a-side bandwidth utilization for every ACTIVE connection
//! - write one point per connection to each configured InfluxDB sink

mod fabric;
mod pipeline;
mod sink;
mod state;

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use chrono::Utc;
use common::config::AppConfig;
use common::errors::AppError;
use pipeline::Pipeline;
use state::AppState;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

const SERVICE_NAME: &str = "stats-collector";

/// Exit status after a completed run, whatever happened to single connections.
const EXIT_DONE: u8 = 0;
/// Exit status after a configuration, authentication or enumeration failure.
const EXIT_FATAL: u8 = 1;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file (if present) before anything else
    load_dotenv(Path::new(".env"));
    init_tracing();

    info!(service = SERVICE_NAME, version = env!("CARGO_PKG_VERSION"), "Starting collection run");
    let mut stdout = std::io::stdout();
    ExitCode::from(execute(setup(), &mut stdout).await)
}

/// Logs go to stderr; stdout is reserved for confirmation lines.
fn init_tracing() {
    let json_logs = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);
    let fmt_layer = if json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// Loads configuration and builds the pipeline.
fn setup() -> anyhow::Result<Pipeline> {
    let config = AppConfig::from_env()?;
    let state = AppState::new(config)?;
    Ok(state.pipeline())
}

/// Runs the pipeline once and returns the process exit status.
async fn execute(setup: anyhow::Result<Pipeline>, out: &mut (dyn Write + Send)) -> u8 {
    let pipeline = match setup {
        Ok(pipeline) => pipeline,
        Err(e) => {
            let code = e
                .downcast_ref::<AppError>()
                .map(AppError::code)
                .unwrap_or("SETUP_ERROR");
            return fatal(out, &format!("{:#}", e), code);
        }
    };

    match pipeline.run_at(Utc::now(), out).await {
        Ok(report) => {
            info!(written = report.written, failed = report.failed, "Done");
            EXIT_DONE
        }
        Err(e) => fatal(out, &e.to_string(), e.code()),
    }
}

/// Reports a run-level failure on `out` and in the logs.
fn fatal(out: &mut (dyn Write + Send), message: &str, code: &str) -> u8 {
    error!(error_code = code, error = %message, "Collection run aborted");
    if let Err(e) = writeln!(out, "Collection run aborted: {}", message) {
        error!(error = %e, "Failed to print abort message");
    }
    EXIT_FATAL
}

/// Load a .env file (best-effort, no error if missing).
fn load_dotenv(env_path: &Path) {
    if let Ok(content) = std::fs::read_to_string(env_path) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                // Only set if not already set by the environment
                if std::env::var_os(key).is_none() {
                    std::env::set_var(key, value);
                }
            }
        }
    }
}
