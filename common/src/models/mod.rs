//! Data model shared by the collector.

pub mod connection;
pub mod metric;
pub mod stats;

// Re-export commonly used types
pub use connection::{
    ConnectionRecord, ConnectionSearchRequest, ConnectionSearchResponse, ConnectionState,
};
pub use metric::{BandwidthFields, FieldValue, MetricPoint, CONNECTION_NAME_TAG, MEASUREMENT};
pub use stats::{BandwidthStats, DirectionStats, StatsResponse, StatsWindow};
