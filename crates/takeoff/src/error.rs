//! Error types for takeoff

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading or writing a formula set document
#[derive(Debug, Error)]
pub enum ImportError {
    /// Document is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Top level of the document is not an array of groups
    #[error("Document must be a JSON array of calculation groups")]
    NotAnArray,

    /// A group lacks a required identifying field
    #[error("Group {index} is missing a non-empty '{field}'")]
    MissingField { index: usize, field: &'static str },

    /// A group has the required fields but the wrong shape elsewhere
    #[error("Group {index} is invalid: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur in takeoff
#[derive(Debug, Error)]
pub enum Error {
    /// Data model error
    #[error(transparent)]
    Core(#[from] takeoff_core::Error),

    /// Import document error
    #[error(transparent)]
    Import(#[from] ImportError),
}
