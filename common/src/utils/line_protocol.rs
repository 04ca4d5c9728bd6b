//! InfluxDB line protocol encoding.
//!
//! ```text
//! measurement,tag1=val1 field1=val1,field2=val2
//! ```
//!
//! Points carry no timestamp; the database assigns the write time.

use crate::models::MetricPoint;

/// Encodes a point as a single line-protocol line.
pub fn to_line_protocol(point: &MetricPoint) -> String {
    let mut line = escape_measurement(point.measurement);

    for (key, value) in point.tags() {
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    line.push(' ');
    for (i, (key, value)) in point.fields.entries().iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&format_float(value.as_f64()));
    }

    line
}

/// Every field is written as a float (no `i` suffix) so one field never changes type.
fn format_float(value: f64) -> String {
    format!("{}", value)
}

/// Spaces and commas must be escaped in measurement names.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Escapes tag keys, tag values and field keys.
///
/// Commas, equals signs, spaces and backslashes are backslash-escaped. Line breaks
/// cannot be escaped and are written as escaped spaces.
fn escape_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' | '\r' => out.push_str("\\ "),
            ',' | '=' | ' ' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
