//! Collection pipeline.
//!
//! One pass per invocation: authenticate, enumerate connections, then for each
//! eligible connection fetch stats, build a point, write it to every sink and
//! print a confirmation line. Setup failures abort the run; failures on a single
//! connection are logged and the loop moves on.

use std::collections::BTreeSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use tracing::Instrument;
use uuid::Uuid;

use common::config::{ApiCredentials, AppConfig};
use common::errors::{AppError, AppResult};
use common::models::{ConnectionRecord, MetricPoint, StatsWindow};
use common::utils::confirmation_line;

use crate::fabric::{AccessToken, FabricApi};
use crate::sink::SinkSet;

/// Per-run settings taken from configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub credentials: ApiCredentials,
    pub excluded_ids: BTreeSet<String>,
    pub window_minutes: i64,
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            credentials: config.api.clone(),
            excluded_ids: config.excluded_ids.clone(),
            window_minutes: config.window_minutes,
        }
    }
}

/// Counters describing one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Records returned by the connection search.
    pub enumerated: usize,
    /// Connections written to at least one sink.
    pub written: usize,
    /// Connections skipped because their id is excluded.
    pub excluded: usize,
    /// Connections skipped because they are not ACTIVE.
    pub inactive: usize,
    /// Records skipped because they lack an id or a name.
    pub incomplete: usize,
    /// Connections whose fetch, transform or every sink write failed.
    pub failed: usize,
    /// Individual sink write failures, including partial ones.
    pub sink_failures: usize,
}

enum Eligibility<'a> {
    Eligible { id: &'a str, name: &'a str },
    Excluded,
    Inactive,
    Incomplete,
}

/// Drives one collection run.
pub struct Pipeline {
    api: Box<dyn FabricApi>,
    sinks: SinkSet,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(api: Box<dyn FabricApi>, sinks: SinkSet, settings: PipelineSettings) -> Self {
        Self {
            api,
            sinks,
            settings,
        }
    }

    /// Runs once with stats windows ending at `now`, printing confirmations to `out`.
    pub async fn run_at(
        &self,
        now: DateTime<Utc>,
        out: &mut (dyn Write + Send),
    ) -> AppResult<RunReport> {
        let span = tracing::info_span!("collection_run", run_id = %Uuid::new_v4());
        self.run_inner(now, out).instrument(span).await
    }

    async fn run_inner(
        &self,
        now: DateTime<Utc>,
        out: &mut (dyn Write + Send),
    ) -> AppResult<RunReport> {
        let credentials = &self.settings.credentials;
        let token = self
            .api
            .authenticate(&credentials.client_id, &credentials.client_secret)
            .await?;
        tracing::info!("Authenticated against Fabric API");

        let connections = self.api.list_connections(&token).await?;
        let window = StatsWindow::ending_at(now, self.settings.window_minutes)?;
        tracing::info!(
            count = connections.len(),
            sinks = self.sinks.len(),
            start = %window.start_param(),
            end = %window.end_param(),
            "Collecting connection stats"
        );

        let mut report = RunReport {
            enumerated: connections.len(),
            ..Default::default()
        };

        for record in &connections {
            let (id, name) = match self.eligibility(record) {
                Eligibility::Eligible { id, name } => (id, name),
                Eligibility::Excluded => {
                    tracing::debug!(id = ?record.id, "Skipping excluded connection");
                    report.excluded += 1;
                    continue;
                }
                Eligibility::Inactive => {
                    tracing::debug!(
                        id = ?record.id,
                        state = ?record.state,
                        "Skipping inactive connection"
                    );
                    report.inactive += 1;
                    continue;
                }
                Eligibility::Incomplete => {
                    tracing::debug!(
                        id = ?record.id,
                        name = ?record.name,
                        "Skipping record without id or name"
                    );
                    report.incomplete += 1;
                    continue;
                }
            };

            match self.collect(&token, id, name, &window, out, &mut report).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    tracing::warn!(
                        id = %id,
                        name = %name,
                        error_code = e.code(),
                        error = %e,
                        "Connection skipped after failure"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            enumerated = report.enumerated,
            written = report.written,
            excluded = report.excluded,
            inactive = report.inactive,
            incomplete = report.incomplete,
            failed = report.failed,
            sink_failures = report.sink_failures,
            "Collection run finished"
        );
        Ok(report)
    }

    fn eligibility<'a>(&self, record: &'a ConnectionRecord) -> Eligibility<'a> {
        if let Some(id) = record.id.as_deref() {
            if self.settings.excluded_ids.contains(id) {
                return Eligibility::Excluded;
            }
        }
        match (record.id.as_deref(), record.name.as_deref()) {
            (Some(id), Some(name)) if !id.is_empty() && !name.is_empty() => {
                if record.is_active() {
                    Eligibility::Eligible { id, name }
                } else {
                    Eligibility::Inactive
                }
            }
            _ => Eligibility::Incomplete,
        }
    }

    /// Fetch, transform, write and confirm one connection.
    async fn collect(
        &self,
        token: &AccessToken,
        id: &str,
        name: &str,
        window: &StatsWindow,
        out: &mut (dyn Write + Send),
        report: &mut RunReport,
    ) -> AppResult<()> {
        let stats = self.api.fetch_stats(token, id, window).await?;
        let point = MetricPoint::from_stats(name, &stats)?;

        let mut written = 0;
        let mut first_error = None;
        for outcome in self.sinks.write_all(&point).await {
            match outcome.result {
                Ok(()) => written += 1,
                Err(e) => {
                    tracing::warn!(
                        id = %id,
                        sink = %outcome.sink,
                        error = %e,
                        "Sink write failed"
                    );
                    report.sink_failures += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        if written == 0 {
            return Err(first_error.unwrap_or_else(|| AppError::SinkWrite {
                sink: "<none>".into(),
                message: "no sinks configured".into(),
            }));
        }

        if let Err(e) = writeln!(out, "{}", confirmation_line(&point)) {
            tracing::warn!(id = %id, error = %e, "Failed to print confirmation line");
        }
        Ok(())
    }
}
