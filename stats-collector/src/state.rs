//! Resources owned by one collector process.

use std::time::Duration;

use anyhow::Context;
use common::config::AppConfig;

use crate::fabric::FabricClient;
use crate::pipeline::{Pipeline, PipelineSettings};
use crate::sink::{InfluxSink, MetricSink, SinkSet};

/// Clients built once at start-up and reused for the whole run.
pub struct AppState {
    pub config: AppConfig,
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Creates the shared HTTP client.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(concat!("stats-collector/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Builds the pipeline with the provider client and one sink per configured database.
    pub fn pipeline(&self) -> Pipeline {
        let api = FabricClient::new(self.config.api_url.clone(), self.http_client.clone());
        let sinks: Vec<Box<dyn MetricSink>> = self
            .config
            .sinks
            .iter()
            .map(|sink| {
                let sink = InfluxSink::from_config(sink, self.http_client.clone());
                Box::new(sink) as Box<dyn MetricSink>
            })
            .collect();

        tracing::info!(
            api_url = %self.config.api_url,
            sinks = sinks.len(),
            excluded = self.config.excluded_ids.len(),
            "Pipeline ready"
        );
        Pipeline::new(
            Box::new(api),
            SinkSet::new(sinks),
            PipelineSettings::from(&self.config),
        )
    }
}
