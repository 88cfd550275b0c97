//! Append-only worksheet writer

use std::fmt::Write as _;

use ahash::AHashMap;
use sheetpack_core::{
    CellRange, CellRef, CellValue, Error, Result as CoreResult, SharedString, SharedStringItem,
    SharedStringTable, StyleRegistry, MAX_COLS,
};

use super::{RowOptions, StreamCell};
use crate::codec::{encode_excel_escapes, escape_text, XML_HEADER};
use crate::error::{XlsxError, XlsxResult};
use crate::package::{canonical_path, Package};

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Where a shared-string cell gets its index from
#[derive(Debug, Clone, Copy)]
enum StringSlot {
    /// Already in the table
    Known(u32),
    /// Position in the writer's pending strings
    Pending(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ColWidth {
    min: u32,
    max: u32,
    width: f64,
}

/// Writes one worksheet part row by row
///
/// Rows must arrive in strictly increasing order, and cells within a row in
/// strictly increasing column order. A rejected row leaves nothing behind.
/// [`StreamWriter::close`] stores the finished part in the package; until
/// then the package keeps its previous bytes. Strings the shared string table
/// does not hold yet are added at close too, so a writer dropped without
/// closing leaves the table untouched.
///
/// At most one writer per part exists at a time, and the package refuses to
/// save while one is open.
pub struct StreamWriter<'p> {
    package: &'p Package,
    path: String,
    /// Buffered `<row>` elements
    sheet_data: String,
    /// New shared strings in first-use order
    pending: Vec<SharedStringItem>,
    pending_ids: AHashMap<SharedStringItem, u32>,
    /// Offsets in `sheet_data` where a pending string's index goes
    pending_refs: Vec<(usize, u32)>,
    cols: Vec<ColWidth>,
    merges: Vec<CellRange>,
    /// Last accepted row; 0 before the first row
    last_row: u32,
    dimension: Option<CellRange>,
    closed: bool,
}

impl<'p> StreamWriter<'p> {
    fn new(package: &'p Package, path: String) -> Self {
        Self {
            package,
            path,
            sheet_data: String::new(),
            pending: Vec::new(),
            pending_ids: AHashMap::new(),
            pending_refs: Vec::new(),
            cols: Vec::new(),
            merges: Vec::new(),
            last_row: 0,
            dimension: None,
            closed: false,
        }
    }

    /// Part path this writer stores into
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Index of the last accepted row, if any
    pub fn last_row(&self) -> Option<u32> {
        (self.last_row > 0).then_some(self.last_row)
    }

    fn ensure_open(&self) -> XlsxResult<()> {
        if self.closed {
            return Err(XlsxError::WriterClosed(self.path.clone()));
        }
        Ok(())
    }

    /// Append a row
    ///
    /// ```rust
    /// use sheetpack_core::CellValue;
    /// use sheetpack_xlsx::{ErrorKind, Package};
    ///
    /// let package = Package::new();
    /// let mut writer = package.stream_writer("Sheet1").unwrap();
    /// writer.add_row(5, vec![(1, CellValue::from(1.0))]).unwrap();
    ///
    /// let err = writer.add_row(3, vec![(1, CellValue::from(2.0))]).unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::OrderViolation);
    /// ```
    pub fn add_row<I, C>(&mut self, row: u32, cells: I) -> XlsxResult<()>
    where
        I: IntoIterator<Item = C>,
        C: Into<StreamCell>,
    {
        self.add_row_with(row, cells, RowOptions::default())
    }

    /// Append a row with row-level attributes
    pub fn add_row_with<I, C>(&mut self, row: u32, cells: I, options: RowOptions) -> XlsxResult<()>
    where
        I: IntoIterator<Item = C>,
        C: Into<StreamCell>,
    {
        self.ensure_open()?;
        let cells: Vec<StreamCell> = cells.into_iter().map(Into::into).collect();

        // Bounds come first so row 0 is a range error, not an order error
        CellRef::new(row, 1)?;
        if row <= self.last_row {
            return Err(XlsxError::RowOrder {
                row,
                last: self.last_row,
            });
        }

        let mut last_col = 0;
        for cell in &cells {
            CellRef::new(row, cell.col)?;
            if cell.col <= last_col {
                return Err(XlsxError::ColumnOrder {
                    row,
                    col: cell.col,
                    last: last_col,
                });
            }
            last_col = cell.col;
        }
        if let Some(height) = options.height {
            if !height.is_finite() || height < 0.0 {
                return Err(Error::invalid_value(
                    CellRef { row, col: 1 },
                    format!("row height {}", height),
                )
                .into());
            }
        }

        self.package.with_styles(|styles: &mut StyleRegistry| -> CoreResult<()> {
            for id in cells.iter().map(|c| c.style).chain(options.style) {
                if !styles.contains(id) {
                    return Err(Error::InvalidStyleIndex(id));
                }
            }
            Ok(())
        })??;

        let found = self.package.with_shared_strings(
            |sst: &mut SharedStringTable| -> CoreResult<Vec<Option<Option<u32>>>> {
                for cell in &cells {
                    cell.value.validate(CellRef { row, col: cell.col }, sst)?;
                }
                Ok(cells
                    .iter()
                    .map(|cell| match &cell.value {
                        CellValue::SharedString(SharedString::Item(item)) => Some(sst.find(item)),
                        _ => None,
                    })
                    .collect())
            },
        )??;

        write_row_start(&mut self.sheet_data, row, &options);
        for (cell, found) in cells.iter().zip(found) {
            let slot = match (&cell.value, found) {
                (_, Some(Some(index))) => Some(StringSlot::Known(index)),
                (CellValue::SharedString(SharedString::Item(item)), Some(None)) => {
                    Some(StringSlot::Pending(self.pend(item)))
                }
                _ => None,
            };
            write_cell(&mut self.sheet_data, &mut self.pending_refs, row, cell, slot);
        }
        self.sheet_data.push_str("</row>");

        let mut written = cells.iter().filter(|c| is_written(c)).map(|c| c.col);
        if let Some(first) = written.next() {
            let last = written.last().unwrap_or(first);
            let first = CellRef { row, col: first };
            let last = CellRef { row, col: last };
            match &mut self.dimension {
                Some(range) => {
                    range.extend(first);
                    range.extend(last);
                }
                None => self.dimension = Some(CellRange::new(first, last)),
            }
        }
        self.last_row = row;
        Ok(())
    }

    fn pend(&mut self, item: &SharedStringItem) -> u32 {
        if let Some(&id) = self.pending_ids.get(item) {
            return id;
        }
        let id = self.pending.len() as u32;
        self.pending.push(item.clone());
        self.pending_ids.insert(item.clone(), id);
        id
    }

    /// Set the width of columns `min..=max`
    ///
    /// Only allowed before the first row.
    pub fn set_col_width(&mut self, min: u32, max: u32, width: f64) -> XlsxResult<()> {
        self.ensure_open()?;
        if self.last_row > 0 {
            return Err(XlsxError::ColumnsAfterRows(self.path.clone()));
        }
        for col in [min, max] {
            if col == 0 || col > MAX_COLS {
                return Err(Error::ColumnOutOfBounds(col, MAX_COLS).into());
            }
        }
        if min > max {
            return Err(Error::InvalidRange(format!("columns {}..{}", min, max)).into());
        }
        if !width.is_finite() || width < 0.0 {
            return Err(Error::invalid_value(
                CellRef { row: 1, col: min },
                format!("column width {}", width),
            )
            .into());
        }
        self.cols.push(ColWidth { min, max, width });
        Ok(())
    }

    /// Merge a range of cells, e.g. `"A1:C1"`
    pub fn merge_cell(&mut self, range: &str) -> XlsxResult<()> {
        self.ensure_open()?;
        let range = CellRange::parse(range)?;
        if range.start == range.end {
            return Err(Error::InvalidRange(format!("{} is a single cell", range)).into());
        }
        if let Some(other) = self.merges.iter().find(|m| m.overlaps(&range)) {
            return Err(Error::InvalidRange(format!("{} overlaps {}", range, other)).into());
        }
        self.merges.push(range);
        Ok(())
    }

    /// Store the worksheet part and end the session
    ///
    /// Calling it again does nothing.
    pub fn close(&mut self) -> XlsxResult<()> {
        if self.closed {
            return Ok(());
        }

        let indices = if self.pending.is_empty() {
            Vec::new()
        } else {
            let pending = &mut self.pending;
            self.package.with_shared_strings(|sst| {
                pending
                    .drain(..)
                    .map(|item| sst.intern_item(item))
                    .collect::<Vec<u32>>()
            })?
        };

        let xml = self.render(&indices);
        self.package.put_raw(&self.path, xml.into_bytes());
        self.closed = true;
        self.sheet_data = String::new();
        self.pending_ids.clear();
        self.pending_refs.clear();
        self.package.end_session(&self.path);
        log::debug!("stream writer stored {} (last row {})", self.path, self.last_row);
        Ok(())
    }

    fn render(&self, indices: &[u32]) -> String {
        let mut xml = String::with_capacity(self.sheet_data.len() + 512);
        xml.push_str(XML_HEADER);
        let _ = write!(xml, "<worksheet xmlns=\"{}\" xmlns:r=\"{}\">", NS_MAIN, NS_R);

        let dimension = self
            .dimension
            .map(|r| r.to_a1_string())
            .unwrap_or_else(|| "A1".to_string());
        let _ = write!(xml, "<dimension ref=\"{}\"/>", dimension);

        if !self.cols.is_empty() {
            xml.push_str("<cols>");
            for c in &self.cols {
                let _ = write!(
                    xml,
                    "<col min=\"{}\" max=\"{}\" width=\"{}\" customWidth=\"1\"/>",
                    c.min, c.max, c.width
                );
            }
            xml.push_str("</cols>");
        }

        if self.sheet_data.is_empty() {
            xml.push_str("<sheetData/>");
        } else {
            xml.push_str("<sheetData>");
            let mut last = 0;
            for &(at, pending) in &self.pending_refs {
                xml.push_str(&self.sheet_data[last..at]);
                let _ = write!(xml, "{}", indices[pending as usize]);
                last = at;
            }
            xml.push_str(&self.sheet_data[last..]);
            xml.push_str("</sheetData>");
        }

        if !self.merges.is_empty() {
            let _ = write!(xml, "<mergeCells count=\"{}\">", self.merges.len());
            for m in &self.merges {
                let _ = write!(xml, "<mergeCell ref=\"{}\"/>", m);
            }
            xml.push_str("</mergeCells>");
        }

        xml.push_str("</worksheet>");
        xml
    }
}

impl Drop for StreamWriter<'_> {
    fn drop(&mut self) {
        if !self.closed {
            log::warn!(
                "stream writer for {} dropped without close; buffered rows and {} new strings discarded",
                self.path,
                self.pending.len()
            );
            self.package.end_session(&self.path);
        }
    }
}

impl std::fmt::Debug for StreamWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamWriter")
            .field("path", &self.path)
            .field("last_row", &self.last_row)
            .field("closed", &self.closed)
            .finish()
    }
}

fn write_row_start(out: &mut String, row: u32, options: &RowOptions) {
    let _ = write!(out, "<row r=\"{}\"", row);
    if let Some(style) = options.style.filter(|&s| s != 0) {
        let _ = write!(out, " s=\"{}\" customFormat=\"1\"", style);
    }
    if let Some(height) = options.height {
        let _ = write!(out, " ht=\"{}\" customHeight=\"1\"", height);
    }
    if options.hidden {
        out.push_str(" hidden=\"1\"");
    }
    out.push('>');
}

fn write_text_element(out: &mut String, tag: &str, text: &str) {
    let encoded = encode_excel_escapes(text);
    let escaped = escape_text(&encoded);
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        let _ = write!(out, "<{tag} xml:space=\"preserve\">{escaped}</{tag}>");
    } else {
        let _ = write!(out, "<{tag}>{escaped}</{tag}>");
    }
}

/// Empty cells are only written when they carry a style
fn is_written(cell: &StreamCell) -> bool {
    !(cell.value.is_empty() && cell.style == 0)
}

/// Write one validated cell; `slot` is set for shared-string items
///
/// A pending string's index is left out and its offset recorded in `refs`.
fn write_cell(
    out: &mut String,
    refs: &mut Vec<(usize, u32)>,
    row: u32,
    cell: &StreamCell,
    slot: Option<StringSlot>,
) {
    let at = CellRef { row, col: cell.col };
    let style = if cell.style != 0 {
        format!(" s=\"{}\"", cell.style)
    } else {
        String::new()
    };

    match &cell.value {
        CellValue::Empty => {
            if is_written(cell) {
                let _ = write!(out, "<c r=\"{}\"{}/>", at, style);
            }
        }
        CellValue::Number(n) => {
            let _ = write!(out, "<c r=\"{}\"{}><v>{}</v></c>", at, style, n);
        }
        CellValue::SharedString(s) => {
            let _ = write!(out, "<c r=\"{}\"{} t=\"s\"><v>", at, style);
            match (s, slot) {
                (SharedString::Index(i), _) => {
                    let _ = write!(out, "{}", i);
                }
                (SharedString::Item(_), Some(StringSlot::Known(i))) => {
                    let _ = write!(out, "{}", i);
                }
                (SharedString::Item(_), Some(StringSlot::Pending(id))) => refs.push((out.len(), id)),
                // add_row always resolves a slot for items
                (SharedString::Item(_), None) => out.push('0'),
            }
            out.push_str("</v></c>");
        }
        CellValue::InlineString(s) => {
            let _ = write!(out, "<c r=\"{}\"{} t=\"inlineStr\"><is>", at, style);
            write_text_element(out, "t", s);
            out.push_str("</is></c>");
        }
        CellValue::Bool(b) => {
            let _ = write!(out, "<c r=\"{}\"{} t=\"b\"><v>{}</v></c>", at, style, *b as u8);
        }
        CellValue::Error(e) => {
            let _ = write!(out, "<c r=\"{}\"{} t=\"e\"><v>{}</v></c>", at, style, e);
        }
        CellValue::Formula(f) => {
            let cached = f.cached.as_deref().unwrap_or(&CellValue::Empty);
            let t = match cached {
                CellValue::InlineString(_) => " t=\"str\"",
                CellValue::Bool(_) => " t=\"b\"",
                CellValue::Error(_) => " t=\"e\"",
                CellValue::Empty
                | CellValue::Number(_)
                | CellValue::SharedString(_)
                | CellValue::Formula(_) => "",
            };
            let _ = write!(out, "<c r=\"{}\"{}{}>", at, style, t);
            write_text_element(out, "f", &f.expr);
            match cached {
                CellValue::Number(n) => {
                    let _ = write!(out, "<v>{}</v>", n);
                }
                CellValue::InlineString(s) => write_text_element(out, "v", s),
                CellValue::Bool(b) => {
                    let _ = write!(out, "<v>{}</v>", *b as u8);
                }
                CellValue::Error(e) => {
                    let _ = write!(out, "<v>{}</v>", e);
                }
                // Rejected by validation
                CellValue::Empty | CellValue::SharedString(_) | CellValue::Formula(_) => {}
            }
            out.push_str("</c>");
        }
    }
}

impl Package {
    /// Open a streaming writer on a worksheet by sheet name
    pub fn stream_writer(&self, sheet: &str) -> XlsxResult<StreamWriter<'_>> {
        let path = self.sheet_path(sheet)?;
        self.stream_writer_for_path(&path)
    }

    /// Open a streaming writer on a worksheet part by path
    ///
    /// Fails with [`XlsxError::SessionOpen`] while another writer holds the
    /// same part.
    pub fn stream_writer_for_path(&self, path: &str) -> XlsxResult<StreamWriter<'_>> {
        let path = canonical_path(path);
        self.begin_session(&path)?;
        Ok(StreamWriter::new(self, path))
    }
}
