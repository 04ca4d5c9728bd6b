//! Bandwidth statistics models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Timestamp format expected by the stats API.
pub const WINDOW_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Response body of `GET /fabric/v4/connections/{id}/stats`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub stats: Option<Stats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default)]
    pub bandwidth_utilization: Option<BandwidthUtilization>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BandwidthUtilization {
    #[serde(default)]
    pub inbound: Option<DirectionStats>,
    #[serde(default)]
    pub outbound: Option<DirectionStats>,
}

/// Utilization summary for one traffic direction.
///
/// Values are kept as raw JSON so that a non-numeric value survives until the
/// transformer rejects it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionStats {
    #[serde(default)]
    pub max: Option<serde_json::Value>,
    #[serde(default)]
    pub mean: Option<serde_json::Value>,
    #[serde(default)]
    pub last_polled: Option<serde_json::Value>,
}

/// Inbound and outbound utilization of one connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandwidthStats {
    pub inbound: DirectionStats,
    pub outbound: DirectionStats,
}

impl From<StatsResponse> for BandwidthStats {
    fn from(resp: StatsResponse) -> Self {
        let utilization = resp
            .stats
            .and_then(|s| s.bandwidth_utilization)
            .unwrap_or_default();
        Self {
            inbound: utilization.inbound.unwrap_or_default(),
            outbound: utilization.outbound.unwrap_or_default(),
        }
    }
}

/// Time range a stats query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl StatsWindow {
    /// Window of `minutes` ending at `now`.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the start would fall outside the representable range.
    pub fn ending_at(now: DateTime<Utc>, minutes: i64) -> AppResult<Self> {
        let start = Duration::try_minutes(minutes)
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| {
                AppError::Config(format!("stats window of {} minutes is out of range", minutes))
            })?;
        Ok(Self { start, end: now })
    }

    /// `startDateTime` query value.
    pub fn start_param(&self) -> String {
        self.start.format(WINDOW_TIME_FORMAT).to_string()
    }

    /// `endDateTime` query value.
    pub fn end_param(&self) -> String {
        self.end.format(WINDOW_TIME_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_window_is_24h_ending_now() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 15).unwrap();
        let window = StatsWindow::ending_at(now, 1440).unwrap();
        assert_eq!(window.start_param(), "2024-02-29T00:30:15Z");
        assert_eq!(window.end_param(), "2024-03-01T00:30:15Z");
    }

    #[test]
    fn test_window_format_drops_subseconds() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap()
            + Duration::milliseconds(987);
        let window = StatsWindow::ending_at(now, 1440).unwrap();
        assert_eq!(window.end_param(), "2024-12-31T23:59:59Z");
        assert_eq!(window.start_param(), "2024-12-30T23:59:59Z");
    }

    #[test]
    fn test_stats_response_full() {
        let resp: StatsResponse = serde_json::from_value(json!({
            "stats": {"bandwidthUtilization": {
                "unit": "Mbps",
                "inbound": {"max": 12.5, "mean": 3.25, "lastPolled": 1},
                "outbound": {"max": 7.0, "mean": 2.0, "lastPolled": 0.5}
            }}
        }))
        .unwrap();
        let stats = BandwidthStats::from(resp);
        assert_eq!(stats.inbound.max, Some(json!(12.5)));
        assert_eq!(stats.inbound.last_polled, Some(json!(1)));
        assert_eq!(stats.outbound.mean, Some(json!(2.0)));
    }

    #[test]
    fn test_stats_response_missing_sections_degrade_to_absent() {
        let resp: StatsResponse = serde_json::from_value(json!({
            "stats": {"bandwidthUtilization": {"inbound": {"max": 1.0}}}
        }))
        .unwrap();
        let stats = BandwidthStats::from(resp);
        assert_eq!(stats.inbound.max, Some(json!(1.0)));
        assert_eq!(stats.inbound.mean, None);
        assert_eq!(stats.outbound, DirectionStats::default());

        let empty: StatsResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(BandwidthStats::from(empty), BandwidthStats::default());
    }

    #[test]
    fn test_window_out_of_range_is_config_error() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            StatsWindow::ending_at(now, i64::MAX),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            StatsWindow::ending_at(now, 6_000_000_000_000),
            Err(AppError::Config(_))
        ));
    }
}
