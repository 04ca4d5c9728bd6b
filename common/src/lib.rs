//! Shared building blocks of the Fabric stats collector.
//!
//! - [`config`]: environment-driven configuration
//! - [`errors`]: run-level and per-connection error taxonomy
//! - [`models`]: provider wire types, stats and metric points
//! - [`utils`]: line protocol and confirmation line formatting

pub mod config;
pub mod errors;
pub mod models;
pub mod utils;
