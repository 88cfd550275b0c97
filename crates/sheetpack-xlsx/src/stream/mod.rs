//! Row-at-a-time worksheet access
//!
//! [`StreamWriter`] appends rows in strictly increasing order and stores the
//! finished worksheet part on close. [`StreamReader`] walks the rows of a
//! stored worksheet part without building a sheet model.

mod reader;
mod writer;

pub use reader::StreamReader;
pub use writer::StreamWriter;

use sheetpack_core::CellValue;

/// One cell of a streamed row
#[derive(Debug, Clone, PartialEq)]
pub struct StreamCell {
    /// 1-based column
    pub col: u32,
    pub value: CellValue,
    /// Style id in the workbook's style registry
    pub style: u32,
}

impl StreamCell {
    pub fn new(col: u32, value: CellValue) -> Self {
        Self {
            col,
            value,
            style: 0,
        }
    }

    pub fn with_style(mut self, style: u32) -> Self {
        self.style = style;
        self
    }
}

impl From<(u32, CellValue)> for StreamCell {
    fn from((col, value): (u32, CellValue)) -> Self {
        StreamCell::new(col, value)
    }
}

impl From<(u32, CellValue, u32)> for StreamCell {
    fn from((col, value, style): (u32, CellValue, u32)) -> Self {
        StreamCell { col, value, style }
    }
}

/// One streamed row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamRow {
    /// 1-based row index
    pub index: u32,
    /// Custom height in points
    pub height: Option<f64>,
    pub hidden: bool,
    /// Cells in increasing column order
    pub cells: Vec<StreamCell>,
}

impl StreamRow {
    /// The cell in column `col`, if present
    pub fn cell(&self, col: u32) -> Option<&StreamCell> {
        self.cells
            .binary_search_by_key(&col, |c| c.col)
            .ok()
            .map(|i| &self.cells[i])
    }
}

/// Row-level attributes for [`StreamWriter::add_row_with`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RowOptions {
    /// Custom height in points
    pub height: Option<f64>,
    pub hidden: bool,
    /// Default style for the row's empty cells
    pub style: Option<u32>,
}
