//! # sheetpack-core
//!
//! Core data structures for the sheetpack spreadsheet package library.
//!
//! This crate has no I/O. It provides:
//! - [`CellRef`] and [`CellRange`] - A1 reference encoding and decoding
//! - [`CellValue`] - The tagged union of values a streamed cell can hold
//! - [`SharedStringTable`] - Append-only deduplicating string pool
//! - [`StyleRegistry`] - Append-only deduplicating style pool
//!
//! ## Example
//!
//! ```rust
//! use sheetpack_core::{CellRef, SharedStringTable, Style, StyleRegistry};
//!
//! let r = CellRef::decode("$ab12").unwrap();
//! assert_eq!((r.row, r.col), (12, 28));
//! assert_eq!(r.to_string(), "AB12");
//!
//! let mut sst = SharedStringTable::new();
//! assert_eq!(sst.intern("hello", Vec::new()), 0);
//! assert_eq!(sst.intern("hello", Vec::new()), 0);
//!
//! let mut styles = StyleRegistry::new();
//! let bold = styles.register(Style::new().bold(true));
//! assert_eq!(bold, 1);
//! ```

pub mod cell;
pub mod error;
pub mod sst;
pub mod style;

pub use cell::{CellError, CellRange, CellRef, CellValue, Formula, SharedString};
pub use error::{Error, Result};
pub use sst::{RichTextRun, RunFont, SharedStringItem, SharedStringTable};
pub use style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, NumberFormat, PatternType, Protection, Style, StyleRegistry, Underline,
    VerticalAlignment,
};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;

/// Maximum number of characters in a single cell
pub const MAX_CELL_CHARS: usize = 32_767;
