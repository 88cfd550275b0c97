//! Cell-related types
//!
//! This module contains:
//! - [`CellRef`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")
//! - [`CellValue`] - The value carried by a streamed cell

mod address;
mod value;

pub use address::{column_to_letters, letters_to_column, CellRange, CellRef};
pub use value::{CellError, CellValue, Formula, SharedString};
