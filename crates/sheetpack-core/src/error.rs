//! Error types for sheetpack-core
//!
//! Every variant here is a range failure: a reference, index or value that
//! falls outside what the current session can resolve.

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetpack-core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed cell reference
    #[error("Invalid cell reference: {0}")]
    InvalidAddress(String),

    /// Malformed cell range
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Row index out of bounds
    #[error("Row {0} out of bounds (1..={1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column {0} out of bounds (1..={1})")]
    ColumnOutOfBounds(u32, u32),

    /// Style id not present in the registry
    #[error("Invalid style index: {0}")]
    InvalidStyleIndex(u32),

    /// Shared string index not present in the table
    #[error("Invalid shared string index: {0}")]
    InvalidStringIndex(u32),

    /// Cell payload does not satisfy its declared type
    #[error("Invalid value in cell {cell}: {reason}")]
    InvalidValue { cell: String, reason: String },
}

impl Error {
    /// Create an [`Error::InvalidValue`] for the given cell
    pub fn invalid_value<C: ToString, S: Into<String>>(cell: C, reason: S) -> Self {
        Error::InvalidValue {
            cell: cell.to_string(),
            reason: reason.into(),
        }
    }
}
