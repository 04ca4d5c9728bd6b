//! Formatting helpers.

pub mod confirmation;
pub mod line_protocol;

// Re-export commonly used functions
pub use confirmation::confirmation_line;
pub use line_protocol::to_line_protocol;
