//! A1 cell references and ranges
//!
//! Rows and columns are both 1-based here, matching the textual form: `A1` is
//! `(row 1, col 1)` and `XFD1048576` is the bottom-right cell of a sheet.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A single cell reference (e.g. "A1", "$B$2")
///
/// Absolute markers are accepted on input but not retained; the canonical
/// form produced by [`CellRef::encode`] and `Display` never contains `$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRef {
    /// Row number (1-based)
    pub row: u32,
    /// Column number (1-based, A=1, XFD=16384)
    pub col: u32,
}

impl CellRef {
    /// Create a reference from 1-based coordinates, checking bounds
    pub fn new(row: u32, col: u32) -> Result<Self> {
        check_row(row)?;
        check_col(col)?;
        Ok(Self { row, col })
    }

    /// Decode an A1-style reference
    ///
    /// # Examples
    /// ```
    /// use sheetpack_core::CellRef;
    ///
    /// let r = CellRef::decode("C7").unwrap();
    /// assert_eq!((r.row, r.col), (7, 3));
    ///
    /// assert!(CellRef::decode("A0").is_err());
    /// assert!(CellRef::decode("XFE1").is_err());
    /// ```
    pub fn decode(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty reference".into()));
        }

        let bytes = s.as_bytes();
        let mut pos = 0;

        if bytes.first() == Some(&b'$') {
            pos += 1;
        }

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        if pos == col_start {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }
        let col = letters_to_column(&s[col_start..pos])?;

        if bytes.get(pos) == Some(&b'$') {
            pos += 1;
        }

        let digits = &s[pos..];
        if digits.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress(format!(
                "invalid row number in '{}'",
                s
            )));
        }

        let significant = digits.trim_start_matches('0');
        if significant.len() > 7 {
            return Err(Error::InvalidAddress(format!(
                "row number too large in '{}'",
                s
            )));
        }
        let row: u32 = if significant.is_empty() {
            0
        } else {
            significant
                .parse()
                .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?
        };

        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                s
            )));
        }
        check_row(row)?;

        Ok(Self { row, col })
    }

    /// Encode 1-based coordinates in canonical A1 form
    pub fn encode(row: u32, col: u32) -> Result<String> {
        Ok(Self::new(row, col)?.to_string())
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", letters_unchecked(self.col), self.row)
    }
}

impl FromStr for CellRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

/// Convert a 1-based column number to letters (1 = A, 26 = Z, 27 = AA)
pub fn column_to_letters(col: u32) -> Result<String> {
    check_col(col)?;
    Ok(letters_unchecked(col))
}

fn letters_unchecked(col: u32) -> String {
    let mut buf = [0u8; 8];
    let mut pos = buf.len();
    let mut n = col;

    while n > 0 {
        n -= 1;
        pos -= 1;
        buf[pos] = (n % 26) as u8 + b'A';
        n /= 26;
    }

    String::from_utf8_lossy(&buf[pos..]).into_owned()
}

/// Convert column letters to a 1-based column number (A = 1, AA = 27)
///
/// Letters are case-insensitive.
pub fn letters_to_column(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidAddress("empty column letters".into()));
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidAddress(format!(
                "invalid column letter '{}'",
                c
            )));
        }
        col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        if col > MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS));
        }
    }

    Ok(col)
}

fn check_row(row: u32) -> Result<()> {
    if row == 0 || row > MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS));
    }
    Ok(())
}

fn check_col(col: u32) -> Result<()> {
    if col == 0 || col > MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col, MAX_COLS));
    }
    Ok(())
}

/// A rectangular range of cells (e.g. "A1:C10")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRange {
    /// Top-left corner
    pub start: CellRef,
    /// Bottom-right corner
    pub end: CellRef,
}

impl CellRange {
    /// Create a range, normalizing so `start` is the top-left corner
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef {
                row: a.row.min(b.row),
                col: a.col.min(b.col),
            },
            end: CellRef {
                row: a.row.max(b.row),
                col: a.col.max(b.col),
            },
        }
    }

    /// A range covering one cell
    pub fn single(cell: CellRef) -> Self {
        Self {
            start: cell,
            end: cell,
        }
    }

    /// Parse "A1:B10" (or a single reference)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once(':') {
            Some((a, b)) => {
                let start = CellRef::decode(a)
                    .map_err(|_| Error::InvalidRange(s.to_string()))?;
                let end = CellRef::decode(b)
                    .map_err(|_| Error::InvalidRange(s.to_string()))?;
                Ok(Self::new(start, end))
            }
            None => Ok(Self::single(CellRef::decode(s)?)),
        }
    }

    /// Grow the range to cover `cell`
    pub fn extend(&mut self, cell: CellRef) {
        *self = Self::new(
            CellRef {
                row: self.start.row.min(cell.row),
                col: self.start.col.min(cell.col),
            },
            CellRef {
                row: self.end.row.max(cell.row),
                col: self.end.col.max(cell.col),
            },
        );
    }

    /// Check if a cell lies within this range
    pub fn contains(&self, cell: &CellRef) -> bool {
        cell.row >= self.start.row
            && cell.row <= self.end.row
            && cell.col >= self.start.col
            && cell.col <= self.end.col
    }

    /// Check if this range overlaps another
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }

    /// Format as "A1:B10", or "A1" for a single cell
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_string()
        } else {
            format!("{}:{}", self.start, self.end)
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
