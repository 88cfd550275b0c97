//! XLSX error types

use std::fmt;

use thiserror::Error;

/// Result type for package and streaming operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Bytes of a part that could not be decoded as XML under any supported charset,
/// or XML that does not match the expected shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("XML syntax error on line {line}: {reason}")]
pub struct DecodeError {
    /// 1-based line of the offending input
    pub line: u64,
    pub reason: String,
}

impl DecodeError {
    pub fn new<S: Into<String>>(line: u64, reason: S) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while working with a package
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Corrupt or unreadable zip container
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The container is a zip but not a package
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Uncompressed content over the configured limit
    #[error("archive entry {part} exceeds the size limit of {limit} bytes")]
    SizeLimit { part: String, limit: u64 },

    /// Part bytes could not be decoded
    #[error("xml decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A mandatory part has no bytes
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// No sheet with this name in the workbook
    #[error("sheet {0} does not exist")]
    SheetNotFound(String),

    /// Streaming writer row out of order
    #[error("row {row} must be greater than the previous row {last}")]
    RowOrder { row: u32, last: u32 },

    /// Streaming writer column out of order within a row
    #[error("column {col} in row {row} must be greater than the previous column {last}")]
    ColumnOrder { row: u32, col: u32, last: u32 },

    /// Operation on a closed streaming writer
    #[error("stream writer for {0} is closed")]
    WriterClosed(String),

    /// A streaming writer on this part is still open
    #[error("a stream writer for {0} is still open")]
    SessionOpen(String),

    /// A forward-only reader was asked for a row behind its cursor
    #[error("row {row} is behind the reader cursor at row {cursor}; use an indexed reader")]
    ReaderForwardOnly { row: u32, cursor: u32 },

    /// Column layout set after rows were written
    #[error("columns of {0} must be set before the first row")]
    ColumnsAfterRows(String),

    /// save() on a package that was not opened from a file
    #[error("package has no file path; use save_as")]
    NoPath,

    /// Invalid reference, index or value
    #[error(transparent)]
    Range(#[from] sheetpack_core::Error),
}

/// The category an [`XlsxError`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Decode,
    MissingPart,
    OrderViolation,
    State,
    Range,
    Archive,
    Io,
}

impl XlsxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            XlsxError::Io(_) => ErrorKind::Io,
            XlsxError::Archive(_) | XlsxError::InvalidFormat(_) | XlsxError::SizeLimit { .. } => {
                ErrorKind::Archive
            }
            XlsxError::Decode(_) => ErrorKind::Decode,
            XlsxError::MissingPart(_) | XlsxError::SheetNotFound(_) => ErrorKind::MissingPart,
            XlsxError::RowOrder { .. } | XlsxError::ColumnOrder { .. } => {
                ErrorKind::OrderViolation
            }
            XlsxError::WriterClosed(_)
            | XlsxError::SessionOpen(_)
            | XlsxError::ReaderForwardOnly { .. }
            | XlsxError::ColumnsAfterRows(_)
            | XlsxError::NoPath => ErrorKind::State,
            XlsxError::Range(_) => ErrorKind::Range,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Decode => "decode",
            ErrorKind::MissingPart => "missing part",
            ErrorKind::OrderViolation => "order violation",
            ErrorKind::State => "state",
            ErrorKind::Range => "range",
            ErrorKind::Archive => "archive",
            ErrorKind::Io => "io",
        })
    }
}
