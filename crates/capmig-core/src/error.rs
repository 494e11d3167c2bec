//! Error types for the classification core

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the classification core.
///
/// Data anomalies (duplicate declarations, unknown names, unmatched
/// capabilities) never surface here; they are resolved by classification
/// rules or tracked in the result structures.
#[derive(Error, Debug)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
