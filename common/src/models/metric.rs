//! Time-series point written to every sink.

use std::fmt;

use crate::errors::{AppError, AppResult};
use crate::models::stats::{BandwidthStats, DirectionStats};

/// Measurement every point belongs to.
pub const MEASUREMENT: &str = "equinix_multicloud_stats";

/// Tag key carrying the connection name.
pub const CONNECTION_NAME_TAG: &str = "Connection_name";

/// Decimal places kept on every field.
const FIELD_DECIMALS: usize = 3;

/// Numeric field value.
///
/// Integers reported by the API stay integers; floats are rounded to three decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// 64-bit floating point.
    Float(f64),
    /// 64-bit signed integer.
    Integer(i64),
}

impl FieldValue {
    /// Value as a float.
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Float(v) => *v,
            FieldValue::Integer(v) => *v as f64,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Integer(v) => write!(f, "{}", v),
        }
    }
}

/// The six numeric fields of a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandwidthFields {
    pub max_inbound: FieldValue,
    pub mean_inbound: FieldValue,
    pub last_polled_inbound: FieldValue,
    pub max_outbound: FieldValue,
    pub mean_outbound: FieldValue,
    pub last_polled_outbound: FieldValue,
}

impl BandwidthFields {
    /// Field keys and values in write order.
    pub fn entries(&self) -> [(&'static str, FieldValue); 6] {
        [
            ("max_inbound", self.max_inbound),
            ("mean_inbound", self.mean_inbound),
            ("lastPolled_inbound", self.last_polled_inbound),
            ("max_outbound", self.max_outbound),
            ("mean_outbound", self.mean_outbound),
            ("lastPolled_outbound", self.last_polled_outbound),
        ]
    }
}

/// One point of the `equinix_multicloud_stats` measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub measurement: &'static str,
    pub connection_name: String,
    pub fields: BandwidthFields,
}

impl MetricPoint {
    /// Tag set of the point.
    pub fn tags(&self) -> [(&'static str, &str); 1] {
        [(CONNECTION_NAME_TAG, self.connection_name.as_str())]
    }

    /// Builds a point from raw stats.
    ///
    /// # Errors
    /// Returns `AppError::Data` if any of the six values is absent or not a number.
    pub fn from_stats(connection_name: &str, stats: &BandwidthStats) -> AppResult<Self> {
        let (max_inbound, mean_inbound, last_polled_inbound) =
            direction_fields("inbound", &stats.inbound)?;
        let (max_outbound, mean_outbound, last_polled_outbound) =
            direction_fields("outbound", &stats.outbound)?;

        Ok(Self {
            measurement: MEASUREMENT,
            connection_name: connection_name.to_string(),
            fields: BandwidthFields {
                max_inbound,
                mean_inbound,
                last_polled_inbound,
                max_outbound,
                mean_outbound,
                last_polled_outbound,
            },
        })
    }
}

type DirectionFields = (FieldValue, FieldValue, FieldValue);

fn direction_fields(direction: &str, stats: &DirectionStats) -> AppResult<DirectionFields> {
    Ok((
        required(direction, "max", stats.max.as_ref())?,
        required(direction, "mean", stats.mean.as_ref())?,
        required(direction, "lastPolled", stats.last_polled.as_ref())?,
    ))
}

fn required(
    direction: &str,
    key: &str,
    value: Option<&serde_json::Value>,
) -> AppResult<FieldValue> {
    let value = value.ok_or_else(|| AppError::Data(format!("{}.{} is missing", direction, key)))?;
    if let Some(integer) = value.as_i64() {
        return Ok(FieldValue::Integer(integer));
    }
    let number = value.as_f64().filter(|v| v.is_finite()).ok_or_else(|| {
        AppError::Data(format!("{}.{} is not a number: {}", direction, key, value))
    })?;
    round_decimals(number, FIELD_DECIMALS).map(FieldValue::Float)
}

/// Rounds `value` to `decimals` places, ties resolved on the exact binary value.
pub fn round_decimals(value: f64, decimals: usize) -> AppResult<f64> {
    format!("{:.*}", decimals, value)
        .parse()
        .map_err(|e| AppError::Data(format!("cannot round {}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn direction(max: Value, mean: Value, last: Value) -> DirectionStats {
        DirectionStats {
            max: Some(max),
            mean: Some(mean),
            last_polled: Some(last),
        }
    }

    fn complete_stats() -> BandwidthStats {
        BandwidthStats {
            inbound: direction(json!(987.654321), json!(123.456789), json!(5)),
            outbound: direction(json!(0.0004), json!(2.0005), json!(1e9)),
        }
    }

    #[test]
    fn test_fields_rounded_to_three_decimals() {
        let point = MetricPoint::from_stats("aws-primary", &complete_stats()).unwrap();
        assert_eq!(point.measurement, "equinix_multicloud_stats");
        assert_eq!(point.tags(), [("Connection_name", "aws-primary")]);
        assert_eq!(point.fields.max_inbound, FieldValue::Float(987.654));
        assert_eq!(point.fields.mean_inbound, FieldValue::Float(123.457));
        assert_eq!(point.fields.max_outbound, FieldValue::Float(0.0));
        assert_eq!(point.fields.last_polled_outbound, FieldValue::Float(1e9));
    }

    #[test]
    fn test_integer_values_stay_integers() {
        let point = MetricPoint::from_stats("aws-primary", &complete_stats()).unwrap();
        assert_eq!(point.fields.last_polled_inbound, FieldValue::Integer(5));
        assert_eq!(point.fields.last_polled_inbound.as_f64(), 5.0);
        assert_eq!(FieldValue::Integer(5).to_string(), "5");
    }

    #[test]
    fn test_field_order() {
        let point = MetricPoint::from_stats("x", &complete_stats()).unwrap();
        let keys: Vec<&str> = point.fields.entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            [
                "max_inbound",
                "mean_inbound",
                "lastPolled_inbound",
                "max_outbound",
                "mean_outbound",
                "lastPolled_outbound"
            ]
        );
    }

    #[test]
    fn test_missing_value_is_data_error() {
        let mut stats = complete_stats();
        stats.outbound.last_polled = None;
        let err = MetricPoint::from_stats("x", &stats).unwrap_err();
        assert!(matches!(err, AppError::Data(_)));
        assert!(err.to_string().contains("outbound.lastPolled"));
    }

    #[test]
    fn test_non_numeric_value_is_data_error() {
        let mut stats = complete_stats();
        stats.inbound.mean = Some(json!("12.5"));
        assert!(matches!(
            MetricPoint::from_stats("x", &stats),
            Err(AppError::Data(_))
        ));
    }

    #[test]
    fn test_round_decimals() {
        assert_eq!(round_decimals(123.456789, 3).unwrap(), 123.457);
        assert_eq!(round_decimals(-1.23456, 3).unwrap(), -1.235);
        assert_eq!(round_decimals(42.0, 3).unwrap(), 42.0);
    }
}
