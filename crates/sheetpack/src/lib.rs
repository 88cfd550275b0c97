//! # sheetpack
//!
//! Read, patch and stream OOXML spreadsheet packages.
//!
//! A [`Package`] keeps every part of an `.xlsx` archive as bytes and decodes
//! typed views on demand. Worksheets are produced and consumed a row at a
//! time, so a sheet never has to fit in a cell model.
//!
//! ## Features
//!
//! - Lossless open/patch/save of any part, modelled or not
//! - Legacy-charset tolerant XML decoding with line-accurate errors
//! - Shared string and style pools with stable ids
//! - Streaming row writer and forward-only row reader
//! - Application and core document properties
//!
//! ## Example
//!
//! ```rust
//! use sheetpack::prelude::*;
//!
//! let package = Package::new();
//! let bold = package
//!     .with_styles(|styles| styles.register(Style::new().bold(true)))
//!     .unwrap();
//!
//! let mut writer = package.stream_writer("Sheet1").unwrap();
//! writer
//!     .add_row(1, vec![(1, CellValue::text("total"), bold), (2, CellValue::from(42.0), 0)])
//!     .unwrap();
//! writer.close().unwrap();
//!
//! let row = package.stream_reader("Sheet1").unwrap().next().unwrap().unwrap();
//! assert_eq!(row.cells[1].value, CellValue::Number(42.0));
//!
//! // package.save_as("output.xlsx").unwrap();
//! ```

pub mod prelude;

// Re-export core types
pub use sheetpack_core::{
    // Style types
    Alignment,
    BorderEdge,
    BorderLineStyle,
    BorderStyle,
    // Cell types
    CellError,
    CellRange,
    CellRef,
    CellValue,
    Color,
    // Error types
    Error,
    FillStyle,
    FontStyle,
    Formula,
    HorizontalAlignment,
    NumberFormat,
    PatternType,
    Protection,
    Result,
    // Pools
    RichTextRun,
    RunFont,
    SharedString,
    SharedStringItem,
    SharedStringTable,
    Style,
    StyleRegistry,
    Underline,
    VerticalAlignment,
    // Constants
    MAX_CELL_CHARS,
    MAX_COLS,
    MAX_ROWS,
};

// Re-export package types
pub use sheetpack_xlsx::{
    decode_part, AppProperties, DecodeError, DocProperties, ErrorKind, Options, Package,
    RowOptions, StreamCell, StreamReader, StreamRow, StreamWriter, XlsxError, XmlPart,
    XlsxResult,
};
