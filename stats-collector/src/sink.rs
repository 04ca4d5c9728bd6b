//! Time-series sinks.
//!
//! Every point is written to each configured InfluxDB endpoint independently.

use async_trait::async_trait;

use common::config::SinkConfig;
use common::errors::{AppError, AppResult};
use common::models::MetricPoint;
use common::utils::to_line_protocol;

/// Destination for metric points.
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// Sink name used in logs and errors.
    fn name(&self) -> &str;

    /// Writes one point.
    async fn write(&self, point: &MetricPoint) -> AppResult<()>;
}

/// InfluxDB 1.x sink using the HTTP `/write` endpoint.
pub struct InfluxSink {
    name: String,
    base_url: String,
    database: String,
    username: String,
    password: String,
    http_client: reqwest::Client,
}

impl InfluxSink {
    /// Creates a sink for the endpoint at `base_url`.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            database: database.into(),
            username: username.into(),
            password: password.into(),
            http_client,
        }
    }

    /// Creates a TLS sink from configuration.
    pub fn from_config(config: &SinkConfig, http_client: reqwest::Client) -> Self {
        Self::new(
            config.name.clone(),
            config.base_url(),
            config.database.clone(),
            config.username.clone(),
            config.password.clone(),
            http_client,
        )
    }

    fn write_error(&self, message: String) -> AppError {
        AppError::SinkWrite {
            sink: self.name.clone(),
            message,
        }
    }
}

#[async_trait]
impl MetricSink for InfluxSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, point: &MetricPoint) -> AppResult<()> {
        let response = self
            .http_client
            .post(format!("{}/write", self.base_url))
            .query(&[("db", self.database.as_str())])
            .basic_auth(&self.username, Some(&self.password))
            .body(to_line_protocol(point))
            .send()
            .await
            .map_err(|e| self.write_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.write_error(format!("HTTP {}: {}", status, body.trim())));
        }
        Ok(())
    }
}

/// Outcome of writing one point to one sink.
#[derive(Debug)]
pub struct SinkOutcome {
    pub sink: String,
    pub result: AppResult<()>,
}

/// Ordered collection of sinks sharing one point per write.
pub struct SinkSet {
    sinks: Vec<Box<dyn MetricSink>>,
}

impl SinkSet {
    pub fn new(sinks: Vec<Box<dyn MetricSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Writes `point` to every sink in order. A failed sink never stops the others.
    pub async fn write_all(&self, point: &MetricPoint) -> Vec<SinkOutcome> {
        let mut outcomes = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            let result = sink.write(point).await;
            outcomes.push(SinkOutcome {
                sink: sink.name().to_string(),
                result,
            });
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use common::models::{BandwidthFields, FieldValue, MEASUREMENT};
    use tokio::net::TcpListener;

    fn point() -> MetricPoint {
        MetricPoint {
            measurement: MEASUREMENT,
            connection_name: "dc-1".to_string(),
            fields: BandwidthFields {
                max_inbound: FieldValue::Float(1.5),
                mean_inbound: FieldValue::Float(1.0),
                last_polled_inbound: FieldValue::Integer(12),
                max_outbound: FieldValue::Float(2.5),
                mean_outbound: FieldValue::Float(2.0),
                last_polled_outbound: FieldValue::Float(1.25),
            },
        }
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<(String, bool, String)>>>);

    async fn spawn(status: StatusCode, captured: Captured) -> String {
        let router = Router::new().route(
            "/write",
            post(
                move |Query(params): Query<std::collections::HashMap<String, String>>,
                      headers: HeaderMap,
                      body: String| {
                    let captured = captured.clone();
                    async move {
                        let has_auth = headers
                            .get("Authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(|v| v.starts_with("Basic "))
                            .unwrap_or(false);
                        let db = params.get("db").cloned().unwrap_or_default();
                        captured.0.lock().unwrap().push((db, has_auth, body));
                        status
                    }
                },
            ),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn sink(name: &str, base_url: String) -> Box<dyn MetricSink> {
        let client = reqwest::Client::new();
        Box::new(InfluxSink::new(name, base_url, "metrics", "user", "pass", client))
    }

    #[tokio::test]
    async fn test_influx_write_sends_line_protocol() {
        let captured = Captured::default();
        let url = spawn(StatusCode::NO_CONTENT, captured.clone()).await;

        sink("campus", url).write(&point()).await.unwrap();

        let writes = captured.0.lock().unwrap();
        assert_eq!(writes.len(), 1);
        let (db, has_auth, body) = &writes[0];
        assert_eq!(db, "metrics");
        assert!(has_auth);
        assert_eq!(body, &to_line_protocol(&point()));
    }

    #[tokio::test]
    async fn test_influx_write_non_2xx_is_sink_write_error() {
        let url = spawn(StatusCode::UNAUTHORIZED, Captured::default()).await;
        let err = sink("network", url).write(&point()).await.unwrap_err();
        match err {
            AppError::SinkWrite { sink, message } => {
                assert_eq!(sink, "network");
                assert!(message.contains("401"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_failed_sink_does_not_block_the_next() {
        let failing = spawn(StatusCode::INTERNAL_SERVER_ERROR, Captured::default()).await;
        let captured = Captured::default();
        let healthy = spawn(StatusCode::NO_CONTENT, captured.clone()).await;

        let sinks = SinkSet::new(vec![sink("campus", failing), sink("network", healthy)]);
        let outcomes = sinks.write_all(&point()).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].sink, "campus");
        assert!(outcomes[0].result.is_err());
        assert_eq!(outcomes[1].sink, "network");
        assert!(outcomes[1].result.is_ok());
        assert_eq!(captured.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_from_config_uses_tls() {
        let config = SinkConfig {
            name: "campus".into(),
            host: "influx.example.com".into(),
            port: 8086,
            username: "u".into(),
            password: "p".into(),
            database: "campus_db".into(),
        };
        let sink = InfluxSink::from_config(&config, reqwest::Client::new());
        assert_eq!(sink.name(), "campus");
        assert_eq!(sink.base_url, "https://influx.example.com:8086");
        assert_eq!(sink.database, "campus_db");
    }
}
