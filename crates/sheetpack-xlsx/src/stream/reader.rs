//! Forward-only worksheet reader

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ahash::AHashMap;
use quick_xml::events::{BytesStart, Event};
use sheetpack_core::{
    CellError, CellRef, CellValue, Error, Formula, Result as CoreResult, SharedString,
    SharedStringTable, StyleRegistry, MAX_COLS, MAX_ROWS,
};

use super::{StreamCell, StreamRow};
use crate::charset;
use crate::codec::{decode_excel_escapes, parse_bool, XmlCursor};
use crate::error::{DecodeError, XlsxError, XlsxResult};
use crate::package::{canonical_path, Package};

/// Worksheet text, sharing the part's bytes when they are already UTF-8
#[derive(Clone)]
enum SheetText {
    /// Part bytes; the text starts after a `skip`-byte BOM
    Shared { bytes: Arc<[u8]>, skip: usize },
    Decoded(Arc<str>),
}

impl SheetText {
    fn new(bytes: Arc<[u8]>) -> Result<Self, DecodeError> {
        let skip = match charset::decode_text(&bytes)? {
            Cow::Borrowed(text)
                if std::ptr::eq(text.as_bytes(), &bytes[bytes.len() - text.len()..]) =>
            {
                bytes.len() - text.len()
            }
            Cow::Borrowed(text) => return Ok(SheetText::Decoded(Arc::from(text))),
            Cow::Owned(text) => return Ok(SheetText::Decoded(Arc::from(text))),
        };
        Ok(SheetText::Shared { bytes, skip })
    }

    fn as_str(&self) -> &str {
        match self {
            // SAFETY: `new` keeps the bytes only when they decoded to themselves from `skip` on
            SheetText::Shared { bytes, skip } => unsafe {
                std::str::from_utf8_unchecked(&bytes[*skip..])
            },
            SheetText::Decoded(text) => text,
        }
    }
}

/// Iterates the rows of one worksheet part
///
/// The part is charset-decoded once; rows are parsed one at a time as the
/// iterator advances. Once the iterator returns `None`, or an error, it keeps
/// returning `None`.
///
/// [`StreamReader::row`] looks up a single row. A forward-only reader can
/// only look ahead of its cursor. An [`indexed`](StreamReader::indexed)
/// reader answers any lookup: the first one that does not simply continue
/// the sequence scans the whole part once to map row indices to offsets,
/// which costs O(n) in the size of the part.
pub struct StreamReader<'p> {
    package: &'p Package,
    path: String,
    text: SheetText,
    /// Offset just inside `<sheetData>`, if the part has rows at all
    data_start: Option<usize>,
    /// Offset of the next unread row
    offset: usize,
    /// Index given to the next row without an `r` attribute
    next_implicit: u32,
    /// Last row handed out or skipped over; 0 before the first
    cursor_row: u32,
    /// A row read ahead by [`StreamReader::row`]
    pending: Option<StreamRow>,
    done: bool,
    indexed: bool,
    index: Option<AHashMap<u32, usize>>,
    raw_values: bool,
}

impl<'p> StreamReader<'p> {
    fn new(package: &'p Package, path: String) -> XlsxResult<Self> {
        let bytes = package
            .get(&path)
            .ok_or_else(|| XlsxError::MissingPart(path.clone()))?;
        let text = SheetText::new(bytes)?;
        let data_start = if text.as_str().trim().is_empty() {
            None
        } else {
            locate_sheet_data(text.as_str())?
        };

        Ok(Self {
            package,
            path,
            text,
            data_start,
            offset: data_start.unwrap_or_default(),
            next_implicit: 1,
            cursor_row: 0,
            pending: None,
            done: data_start.is_none(),
            indexed: false,
            index: None,
            raw_values: package.options().raw_cell_value,
        })
    }

    /// Allow [`StreamReader::row`] to go backwards or skip ahead through a
    /// row index built on first need
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Part path this reader walks
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Index of the last row handed out or skipped, if any
    pub fn current_row(&self) -> Option<u32> {
        (self.cursor_row > 0).then_some(self.cursor_row)
    }

    /// Fetch row `index`, or `None` if the sheet has no such row
    ///
    /// On a forward-only reader, rows before the cursor fail with
    /// [`XlsxError::ReaderForwardOnly`], and rows skipped over are gone. On
    /// an indexed reader, a request for the row right after the cursor reads
    /// forward; any other request is served from the index and leaves the
    /// iteration position alone.
    pub fn row(&mut self, index: u32) -> XlsxResult<Option<StreamRow>> {
        if let Some(map) = &self.index {
            return match map.get(&index) {
                Some(&offset) => self.read_at(offset, index).map(Some),
                None => Ok(None),
            };
        }

        if index > self.cursor_row {
            if !self.indexed || index == self.cursor_row + 1 {
                return self.seek_forward(index);
            }
        } else if !self.indexed {
            return Err(XlsxError::ReaderForwardOnly {
                row: index,
                cursor: self.cursor_row,
            });
        }

        self.build_index()?;
        self.row(index)
    }

    fn seek_forward(&mut self, index: u32) -> XlsxResult<Option<StreamRow>> {
        loop {
            let Some(row) = self.advance()? else {
                self.cursor_row = index;
                return Ok(None);
            };
            if row.index < index {
                self.cursor_row = row.index;
                continue;
            }
            self.cursor_row = index;
            if row.index == index {
                return Ok(Some(row));
            }
            self.pending = Some(row);
            return Ok(None);
        }
    }

    fn advance(&mut self) -> XlsxResult<Option<StreamRow>> {
        if let Some(row) = self.pending.take() {
            return Ok(Some(row));
        }
        if self.done {
            return Ok(None);
        }
        match self.read_next() {
            Ok(Some(row)) => Ok(Some(row)),
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    fn read_next(&mut self) -> XlsxResult<Option<StreamRow>> {
        let text = self.text.clone();
        let mut cursor = XmlCursor::at_offset(text.as_str(), self.offset);
        let Some(row) = read_row(&mut cursor, self.next_implicit)? else {
            return Ok(None);
        };
        self.offset = cursor.position();
        self.next_implicit = row.index.saturating_add(1);
        self.resolve(row).map(Some)
    }

    fn read_at(&self, offset: usize, index: u32) -> XlsxResult<StreamRow> {
        let mut cursor = XmlCursor::at_offset(self.text.as_str(), offset);
        let row = read_row(&mut cursor, index)?
            .ok_or_else(|| cursor.error(format!("row {} vanished from the index", index)))?;
        self.resolve(row)
    }

    /// One pass over `<sheetData>` recording where each row starts
    fn build_index(&mut self) -> XlsxResult<()> {
        let mut map = AHashMap::new();
        if let Some(start) = self.data_start {
            let mut cursor = XmlCursor::at_offset(self.text.as_str(), start);
            let mut implicit = 1u32;
            loop {
                let begin = cursor.position();
                let (e, open) = match cursor.next()? {
                    Event::Start(e) => (e, true),
                    Event::Empty(e) => (e, false),
                    Event::End(_) => break,
                    Event::Eof => return Err(cursor.error("unexpected EOF in sheetData").into()),
                    _ => continue,
                };
                if e.local_name().as_ref() == b"row" {
                    let index = cursor.attr_parse::<u32>(&e, b"r")?.unwrap_or(implicit);
                    map.entry(index).or_insert(begin);
                    implicit = index.saturating_add(1);
                }
                if open {
                    cursor.skip(&e)?;
                }
            }
        }
        log::debug!(
            "indexed {} rows of {} in one pass over {} bytes",
            map.len(),
            self.path,
            self.text.as_str().len()
        );
        self.index = Some(map);
        Ok(())
    }

    /// Check style ids and resolve shared strings
    fn resolve(&self, mut row: StreamRow) -> XlsxResult<StreamRow> {
        let cells = &mut row.cells;
        self.package
            .with_styles(|styles: &mut StyleRegistry| -> CoreResult<()> {
                match cells.iter().find(|c| !styles.contains(c.style)) {
                    Some(c) => Err(Error::InvalidStyleIndex(c.style)),
                    None => Ok(()),
                }
            })??;

        let has_shared = cells
            .iter()
            .any(|c| matches!(c.value, CellValue::SharedString(SharedString::Index(_))));
        if has_shared && !self.raw_values {
            self.package
                .with_shared_strings(|sst: &mut SharedStringTable| -> CoreResult<()> {
                    for cell in cells.iter_mut() {
                        if let CellValue::SharedString(SharedString::Index(i)) = cell.value {
                            let item = sst.resolve(i)?.clone();
                            cell.value = CellValue::SharedString(SharedString::Item(item));
                        }
                    }
                    Ok(())
                })??;
        }
        Ok(row)
    }
}

impl Iterator for StreamReader<'_> {
    type Item = XlsxResult<StreamRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(Some(row)) => {
                self.cursor_row = row.index;
                Some(Ok(row))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl std::iter::FusedIterator for StreamReader<'_> {}

impl fmt::Debug for StreamReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamReader")
            .field("path", &self.path)
            .field("cursor_row", &self.cursor_row)
            .field("indexed", &self.indexed)
            .field("done", &self.done)
            .finish()
    }
}

/// Offset just inside `<sheetData>`; `None` when there is no row data
fn locate_sheet_data(text: &str) -> Result<Option<usize>, DecodeError> {
    let mut cursor = XmlCursor::preserving_space(text);
    let (_, empty) = cursor.root("worksheet")?;
    if empty {
        return Ok(None);
    }
    loop {
        match cursor.next()? {
            Event::Start(e) if e.local_name().as_ref() == b"sheetData" => {
                return Ok(Some(cursor.position()))
            }
            Event::Empty(e) if e.local_name().as_ref() == b"sheetData" => return Ok(None),
            Event::Start(e) => cursor.skip(&e)?,
            Event::End(_) => return Ok(None),
            Event::Eof => return Err(cursor.error("unexpected EOF")),
            _ => {}
        }
    }
}

/// Parse the next `<row>`; `None` at the end of `<sheetData>`
fn read_row(cursor: &mut XmlCursor<'_>, implicit: u32) -> Result<Option<StreamRow>, DecodeError> {
    loop {
        let (e, open) = match cursor.next()? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::End(_) => return Ok(None),
            Event::Eof => return Err(cursor.error("unexpected EOF in sheetData")),
            _ => continue,
        };
        if e.local_name().as_ref() == b"row" {
            return parse_row(cursor, &e, open, implicit).map(Some);
        }
        if open {
            cursor.skip(&e)?;
        }
    }
}

fn parse_row(
    cursor: &mut XmlCursor<'_>,
    e: &BytesStart<'_>,
    open: bool,
    implicit: u32,
) -> Result<StreamRow, DecodeError> {
    let index = cursor.attr_parse::<u32>(e, b"r")?.unwrap_or(implicit);
    if index == 0 || index > MAX_ROWS {
        return Err(cursor.error(format!("row index {} out of range", index)));
    }
    let mut row = StreamRow {
        index,
        height: cursor.attr_parse(e, b"ht")?,
        hidden: cursor.attr_bool(e, b"hidden")?.unwrap_or(false),
        cells: Vec::new(),
    };
    if !open {
        return Ok(row);
    }

    let mut next_col = 1;
    cursor.children(|cursor, e, open| {
        if e.local_name().as_ref() != b"c" {
            if open {
                cursor.skip(&e)?;
            }
            return Ok(());
        }
        let cell = parse_cell(cursor, &e, open, index, next_col)?;
        next_col = cell.col.saturating_add(1);
        row.cells.push(cell);
        Ok(())
    })?;
    Ok(row)
}

/// The `t` attribute of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Number,
    SharedString,
    FormulaString,
    InlineString,
    Bool,
    Error,
    Date,
}

impl CellType {
    fn parse(t: Option<&str>) -> Option<Self> {
        match t {
            None | Some("n") => Some(CellType::Number),
            Some("s") => Some(CellType::SharedString),
            Some("str") => Some(CellType::FormulaString),
            Some("inlineStr") => Some(CellType::InlineString),
            Some("b") => Some(CellType::Bool),
            Some("e") => Some(CellType::Error),
            Some("d") => Some(CellType::Date),
            Some(_) => None,
        }
    }
}

fn parse_cell(
    cursor: &mut XmlCursor<'_>,
    e: &BytesStart<'_>,
    open: bool,
    row: u32,
    implicit_col: u32,
) -> Result<StreamCell, DecodeError> {
    let col = match cursor.attr(e, b"r")? {
        Some(r) => {
            let at = CellRef::decode(&r).map_err(|err| cursor.error(err.to_string()))?;
            if at.row != row {
                return Err(cursor.error(format!("cell {} is outside row {}", r, row)));
            }
            at.col
        }
        None => implicit_col,
    };
    if col > MAX_COLS {
        return Err(cursor.error(format!("column {} out of range", col)));
    }

    let t = cursor.attr(e, b"t")?;
    let kind = CellType::parse(t.as_deref())
        .ok_or_else(|| cursor.error(format!("unknown cell type {:?}", t.unwrap_or_default())))?;
    let style = cursor.attr_parse::<u32>(e, b"s")?.unwrap_or(0);

    let mut v = None;
    let mut f = None;
    let mut inline = None;
    if open {
        cursor.children(|cursor, e, open| {
            match (e.local_name().as_ref(), open) {
                (b"v", true) => v = Some(cursor.text_of(&e)?),
                (b"f", true) => f = Some(cursor.text_of(&e)?),
                (b"is", true) => inline = Some(read_inline(cursor)?),
                (_, true) => cursor.skip(&e)?,
                (_, false) => {}
            }
            Ok(())
        })?;
    }

    let value = cell_value(cursor, kind, v, inline)?;
    let value = match f {
        Some(expr) if !expr.trim().is_empty() => CellValue::Formula(Formula {
            expr,
            cached: (!value.is_empty()).then(|| Box::new(value)),
        }),
        // Shared formula followers carry no text; keep the cached value
        _ => value,
    };
    Ok(StreamCell { col, value, style })
}

fn cell_value(
    cursor: &XmlCursor<'_>,
    kind: CellType,
    v: Option<String>,
    inline: Option<String>,
) -> Result<CellValue, DecodeError> {
    if kind == CellType::InlineString {
        return Ok(inline
            .or(v)
            .map(|s| CellValue::InlineString(decode_excel_escapes(&s).into_owned()))
            .unwrap_or_default());
    }
    let Some(v) = v else {
        return Ok(CellValue::Empty);
    };

    match kind {
        CellType::Number => v
            .trim()
            .parse::<f64>()
            .map(CellValue::Number)
            .map_err(|_| cursor.error(format!("invalid number {:?}", v))),
        CellType::SharedString => v
            .trim()
            .parse::<u32>()
            .map(|i| CellValue::SharedString(SharedString::Index(i)))
            .map_err(|_| cursor.error(format!("invalid shared string index {:?}", v))),
        CellType::FormulaString => Ok(CellValue::InlineString(
            decode_excel_escapes(&v).into_owned(),
        )),
        CellType::Bool => parse_bool(&v)
            .map(CellValue::Bool)
            .ok_or_else(|| cursor.error(format!("invalid boolean {:?}", v))),
        CellType::Error => CellError::from_str(&v)
            .map(CellValue::Error)
            .map_err(|_| cursor.error(format!("invalid error value {:?}", v))),
        // ISO 8601 text; left for the caller to interpret
        CellType::Date => Ok(CellValue::InlineString(v)),
        CellType::InlineString => Ok(CellValue::Empty),
    }
}

/// Text of an open `<is>`: direct `<t>` or rich `<r><t>` runs
fn read_inline(cursor: &mut XmlCursor<'_>) -> Result<String, DecodeError> {
    let mut text = String::new();
    cursor.children(|cursor, e, open| {
        match (e.local_name().as_ref(), open) {
            (b"t", true) => text.push_str(&cursor.text_of(&e)?),
            (b"r", true) => cursor.children(|cursor, e, open| {
                match (e.local_name().as_ref(), open) {
                    (b"t", true) => text.push_str(&cursor.text_of(&e)?),
                    (_, true) => cursor.skip(&e)?,
                    (_, false) => {}
                }
                Ok(())
            })?,
            (_, true) => cursor.skip(&e)?,
            (_, false) => {}
        }
        Ok(())
    })?;
    Ok(text)
}

impl Package {
    /// Open a streaming reader on a worksheet by sheet name
    pub fn stream_reader(&self, sheet: &str) -> XlsxResult<StreamReader<'_>> {
        let path = self.sheet_path(sheet)?;
        self.stream_reader_for_path(&path)
    }

    /// Open a streaming reader on a worksheet part by path
    ///
    /// An absent part is [`XlsxError::MissingPart`].
    pub fn stream_reader_for_path(&self, path: &str) -> XlsxResult<StreamReader<'_>> {
        StreamReader::new(self, canonical_path(path))
    }
}
