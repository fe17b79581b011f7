//! Error types shared across the tapeflow services

use thiserror::Error;

/// Tape processing error types
#[derive(Debug, Error)]
pub enum TapeError {
    /// Raw print record rejected before any state change
    #[error("invalid print: {0}")]
    InvalidPrint(String),

    /// Caller asked for something outside a buffer's capacity
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Setup-time configuration failure; never raised mid-stream
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
