//! Confirmation line printed for every written point.
//!
//! The line looks like a compact JSON array, but strings are single-quoted and
//! numbers are left bare:
//!
//! ```text
//! [{'measurement':'equinix_multicloud_stats','tags':{'Connection_name':'dc-1'},
//!   'fields':{'max_inbound':1.5,'lastPolled_inbound':7,...}}]
//! ```

use std::fmt::Write;

use crate::models::{FieldValue, MetricPoint};

/// Renders the confirmation line for `point`.
pub fn confirmation_line(point: &MetricPoint) -> String {
    let mut out = String::from("[{");
    let _ = write!(out, "{}:{}", quote("measurement"), quote(point.measurement));

    out.push(',');
    out.push_str(&quote("tags"));
    out.push_str(":{");
    for (i, (key, value)) in point.tags().iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}:{}", quote(key), quote(value));
    }
    out.push('}');

    out.push(',');
    out.push_str(&quote("fields"));
    out.push_str(":{");
    for (i, (key, value)) in point.fields.entries().iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}:{}", quote(key), number_repr(value));
    }
    out.push_str("}}]");
    out
}

/// Integers print bare (`7`), floats keep a fraction or exponent (`7.0`).
fn number_repr(value: &FieldValue) -> String {
    match value {
        FieldValue::Integer(v) => v.to_string(),
        FieldValue::Float(v) => float_repr(*v),
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Shortest round-trip form, always with a fraction or exponent (`5.0`, `1e+16`, `1.5e-05`).
fn float_repr(value: f64) -> String {
    let debug = format!("{:?}", value);
    match debug.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            Err(_) => debug,
        },
        None => debug,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BandwidthFields, FieldValue, MEASUREMENT};

    #[test]
    fn test_confirmation_line_shape() {
        let point = MetricPoint {
            measurement: MEASUREMENT,
            connection_name: "aws-primary".to_string(),
            fields: BandwidthFields {
                max_inbound: FieldValue::Float(987.654),
                mean_inbound: FieldValue::Float(123.457),
                last_polled_inbound: FieldValue::Integer(5),
                max_outbound: FieldValue::Float(0.0),
                mean_outbound: FieldValue::Float(2.001),
                last_polled_outbound: FieldValue::Float(1000000000.0),
            },
        };
        assert_eq!(
            confirmation_line(&point),
            "[{'measurement':'equinix_multicloud_stats',\
             'tags':{'Connection_name':'aws-primary'},\
             'fields':{'max_inbound':987.654,'mean_inbound':123.457,'lastPolled_inbound':5,\
             'max_outbound':0.0,'mean_outbound':2.001,'lastPolled_outbound':1000000000.0}}]"
        );
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("it's"), "'it\\'s'");
        assert_eq!(quote("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_number_repr_keeps_integers_bare() {
        assert_eq!(number_repr(&FieldValue::Integer(7)), "7");
        assert_eq!(number_repr(&FieldValue::Integer(-3)), "-3");
        assert_eq!(number_repr(&FieldValue::Float(7.0)), "7.0");
    }

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(1.0), "1.0");
        assert_eq!(float_repr(0.001), "0.001");
        assert_eq!(float_repr(-2.5), "-2.5");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(1.25e17), "1.25e+17");
        assert_eq!(float_repr(1.5e-5), "1.5e-05");
    }
}
