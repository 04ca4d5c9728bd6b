//! Error taxonomy shared by the collector.
//!
//! Run-level errors (`Config`, `Auth`, `EmptyResult`) abort a collection run.
//! The remaining variants are scoped to a single connection and never stop the loop.

use thiserror::Error;

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Collector error.
#[derive(Debug, Error)]
pub enum AppError {
    /// Required configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Token request failed or the token was rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Connection search returned no records.
    #[error("no results: {0}")]
    EmptyResult(String),

    /// Stats request failed (transport error or non-2xx status).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// A required numeric value was absent or not a number.
    #[error("invalid data: {0}")]
    Data(String),

    /// A time-series database rejected or failed a write.
    #[error("write to sink `{sink}` failed: {message}")]
    SinkWrite { sink: String, message: String },
}

impl AppError {
    /// Stable code for structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::EmptyResult(_) => "EMPTY_RESULT_ERROR",
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Data(_) => "DATA_ERROR",
            AppError::SinkWrite { .. } => "SINK_WRITE_ERROR",
        }
    }

    /// Whether this error terminates the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Config(_) | AppError::Auth(_) | AppError::EmptyResult(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Config(errors.to_string())
    }
}
