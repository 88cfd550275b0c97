//! Prelude module - common imports for sheetpack users
//!
//! ```rust
//! use sheetpack::prelude::*;
//! ```

pub use crate::{
    // Package and streaming
    AppProperties,
    // Cell types
    CellRef,
    CellValue,
    Color,
    DocProperties,
    // Error types
    ErrorKind,
    FontStyle,
    Formula,
    NumberFormat,
    Options,
    Package,
    RowOptions,
    SharedString,
    StreamCell,
    StreamRow,
    // Style types
    Style,
    XlsxError,
    XlsxResult,
};
