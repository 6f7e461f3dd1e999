use alloy_primitives::hex::FromHexError;
use mega_multicall::{CodecError, MulticallError};

/// Error types for the mega-mcall commands
#[derive(Debug, thiserror::Error)]
pub enum McallError {
    /// Failed to read or write a file
    #[error("Failed to access file: {0}")]
    FileAccess(#[from] std::io::Error),

    /// Invalid JSON document
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid hex string
    #[error("Invalid hex string: {0}")]
    InvalidHex(#[from] FromHexError),

    /// The batch failed as a whole
    #[error("Batch failed: {0}")]
    Multicall(#[from] MulticallError),

    /// Compact or packed encoding error
    #[error("Encoding error: {0}")]
    Codec(#[from] CodecError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for the mega-mcall commands
pub type Result<T> = std::result::Result<T, McallError>;
