//! Error types for takeoff-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing calculation groups
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// No group with the given id
    #[error("Calculation group not found: {0}")]
    GroupNotFound(String),

    /// No formula with the given id in the group
    #[error("Formula not found: {0}")]
    FormulaNotFound(String),

    /// No variable with the given id in the group
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// Another variable in the group already uses this code
    #[error("Variable code already exists in group: {0}")]
    DuplicateCode(String),

    /// Removing the group would leave the collection empty
    #[error("Cannot remove the last calculation group")]
    LastGroup,

    /// A collection must hold at least one group
    #[error("A calculation group collection cannot be empty")]
    EmptyCollection,
}
