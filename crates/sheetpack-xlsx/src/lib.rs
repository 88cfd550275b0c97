//! # sheetpack-xlsx
//!
//! OOXML package store and streaming worksheet engine for sheetpack.
//!
//! A [`Package`] holds every part of an `.xlsx` archive in memory, keyed by
//! path. Parts are stored as raw bytes and decoded on demand through
//! [`XmlPart`] implementations. Worksheets are written and read row by row
//! with [`StreamWriter`] and [`StreamReader`].
//!
//! ```rust
//! use sheetpack_core::CellValue;
//! use sheetpack_xlsx::Package;
//!
//! let package = Package::new();
//! let mut writer = package.stream_writer("Sheet1").unwrap();
//! writer.add_row(1, vec![(1, CellValue::text("id")), (2, CellValue::from(7.0))]).unwrap();
//! writer.close().unwrap();
//!
//! let mut rows = package.stream_reader("Sheet1").unwrap();
//! let row = rows.next().unwrap().unwrap();
//! assert_eq!(row.index, 1);
//! assert_eq!(row.cells.len(), 2);
//! ```

pub mod charset;
pub mod codec;
pub mod docprops;
pub mod error;
pub mod package;
pub mod shared_strings;
pub mod stream;
pub mod styles;
pub mod workbook;

pub use codec::{decode_part, XmlPart};
pub use docprops::{AppProperties, DocProperties};
pub use error::{DecodeError, ErrorKind, XlsxError, XlsxResult};
pub use package::Package;
pub use stream::{RowOptions, StreamCell, StreamReader, StreamRow, StreamWriter};

/// Default budget for the total uncompressed size of an archive
pub const DEFAULT_UNZIP_SIZE_LIMIT: u64 = 16 << 30;

/// Default limit for a single uncompressed part
pub const DEFAULT_PART_SIZE_LIMIT: u64 = 256 << 20;

/// Settings applied when a package is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Total uncompressed bytes the archive may expand to
    pub unzip_size_limit: u64,
    /// Uncompressed bytes a single part may expand to
    pub part_size_limit: u64,
    /// Yield shared-string cells as indices instead of resolved items
    pub raw_cell_value: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            unzip_size_limit: DEFAULT_UNZIP_SIZE_LIMIT,
            part_size_limit: DEFAULT_PART_SIZE_LIMIT,
            raw_cell_value: false,
        }
    }
}
